//! Line classification for .npmrc files.
//!
//! Each physical line of an .npmrc file is classified into a [`Directive`].
//! Only the Artifact Registry line shapes are understood:
//!
//! ```ini
//! @myorg:registry=https://us-npm.pkg.dev/my-project/my-repo/
//! //us-npm.pkg.dev/my-project/my-repo/:_authToken=ya29.token
//! //us-npm.pkg.dev/my-project/my-repo/:_password=cGFzc3dvcmQ=
//! ```
//!
//! Everything else is kept as an opaque line and written back unchanged.

use crate::registry::{auth_token_key, password_key, scope_registry_key, ENDPOINT_PATTERN};
use regex::Regex;
use std::borrow::Cow;
use std::fmt;
use std::sync::LazyLock;

/// Regex for a registry binding: optional `@scope:` prefix, then
/// `registry=https:` and the nerf-darted endpoint.
static REGISTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(@[a-zA-Z0-9\-*~][a-zA-Z0-9\-*._~]*:)?registry=https:({})",
        ENDPOINT_PATTERN
    ))
    .unwrap()
});

static AUTH_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"({}):_authToken=(.*)", ENDPOINT_PATTERN)).unwrap());

static PASSWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"({}):_password=(.*)", ENDPOINT_PATTERN)).unwrap());

/// The kind of a classified line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    Registry,
    AuthToken,
    Password,
    Opaque,
}

/// One classified line of an .npmrc file.
///
/// `Registry`, `AuthToken` and `Password` directives are re-rendered in
/// their canonical form; `Opaque` lines keep their original text.
///
/// The `Debug` implementation redacts tokens and passwords.
#[derive(Clone, PartialEq, Eq)]
pub enum Directive {
    /// `{scope:}registry=https:{registry}`
    Registry {
        scope: Option<String>,
        registry: String,
    },
    /// `{registry}:_authToken={token}`
    AuthToken { registry: String, token: String },
    /// `{registry}:_password={password}`
    Password { registry: String, password: String },
    /// Any other line, verbatim.
    Opaque(String),
}

impl fmt::Debug for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::Registry { scope, registry } => f
                .debug_struct("Registry")
                .field("scope", scope)
                .field("registry", registry)
                .finish(),
            Directive::AuthToken { registry, .. } => f
                .debug_struct("AuthToken")
                .field("registry", registry)
                .field("token", &"[REDACTED]")
                .finish(),
            Directive::Password { registry, .. } => f
                .debug_struct("Password")
                .field("registry", registry)
                .field("password", &"[REDACTED]")
                .finish(),
            Directive::Opaque(text) => f.debug_tuple("Opaque").field(text).finish(),
        }
    }
}

impl Directive {
    /// Create an auth token binding for a registry.
    pub fn auth_token(registry: impl Into<String>, token: impl Into<String>) -> Self {
        Directive::AuthToken {
            registry: registry.into(),
            token: token.into(),
        }
    }

    pub fn kind(&self) -> DirectiveKind {
        match self {
            Directive::Registry { .. } => DirectiveKind::Registry,
            Directive::AuthToken { .. } => DirectiveKind::AuthToken,
            Directive::Password { .. } => DirectiveKind::Password,
            Directive::Opaque(_) => DirectiveKind::Opaque,
        }
    }

    /// The nerf-darted registry this directive refers to, if any.
    pub fn registry(&self) -> Option<&str> {
        match self {
            Directive::Registry { registry, .. }
            | Directive::AuthToken { registry, .. }
            | Directive::Password { registry, .. } => Some(registry),
            Directive::Opaque(_) => None,
        }
    }

    /// The package scope of a registry binding, if any.
    pub fn scope(&self) -> Option<&str> {
        match self {
            Directive::Registry { scope, .. } => scope.as_deref(),
            _ => None,
        }
    }

    /// The token or password carried by this directive.
    pub fn value(&self) -> Option<&str> {
        match self {
            Directive::AuthToken { token, .. } => Some(token),
            Directive::Password { password, .. } => Some(password),
            _ => None,
        }
    }

    /// Render the directive back to a single .npmrc line.
    pub fn to_line(&self) -> Cow<'_, str> {
        match self {
            Directive::Registry { scope, registry } => Cow::Owned(format!(
                "{}=https:{}",
                scope_registry_key(scope.as_deref()),
                registry
            )),
            Directive::AuthToken { registry, token } => {
                Cow::Owned(format!("{}={}", auth_token_key(registry), token))
            }
            Directive::Password { registry, password } => {
                Cow::Owned(format!("{}={}", password_key(registry), password))
            }
            Directive::Opaque(text) => Cow::Borrowed(text),
        }
    }
}

/// Classify a single line.
///
/// Returns the text the directive was recognized from along with the
/// directive itself. Patterns are tried in order registry, auth token,
/// password; the first match wins. For passwords the returned text is
/// rebuilt from the captured registry and value, so anything else on the
/// line is dropped. Lines that match nothing, and comment lines starting
/// with `#` or `;`, come back as [`Directive::Opaque`] with the line verbatim.
///
/// # Examples
///
/// ```
/// use npmrc_auth_rs::{classify, Directive};
///
/// let (_, directive) = classify("@myorg:registry=https://us-npm.pkg.dev/proj/repo/");
/// assert_eq!(
///     directive,
///     Directive::Registry {
///         scope: Some("@myorg".to_string()),
///         registry: "//us-npm.pkg.dev/proj/repo/".to_string(),
///     }
/// );
/// ```
pub fn classify(line: &str) -> (Cow<'_, str>, Directive) {
    if is_comment(line) {
        return (Cow::Borrowed(line), Directive::Opaque(line.to_string()));
    }

    if let Some(caps) = REGISTRY.captures(line) {
        let scope = caps
            .get(1)
            .map(|m| m.as_str().trim_end_matches(':').to_string());
        return (
            Cow::Borrowed(caps.get(0).map_or("", |m| m.as_str())),
            Directive::Registry {
                scope,
                registry: caps[2].to_string(),
            },
        );
    }

    if let Some(caps) = AUTH_TOKEN.captures(line) {
        return (
            Cow::Borrowed(caps.get(0).map_or("", |m| m.as_str())),
            Directive::AuthToken {
                registry: caps[1].to_string(),
                token: caps[2].to_string(),
            },
        );
    }

    if let Some(caps) = PASSWORD.captures(line) {
        return (
            Cow::Owned(format!("{}:_password={}", &caps[1], &caps[2])),
            Directive::Password {
                registry: caps[1].to_string(),
                password: caps[2].to_string(),
            },
        );
    }

    (Cow::Borrowed(line), Directive::Opaque(line.to_string()))
}

/// Commented-out lines stay Opaque even when they look like a binding; see
/// the comment-line note on [`classify`].
fn is_comment(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with('#') || trimmed.starts_with(';')
}
