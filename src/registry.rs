//! Config keys for Artifact Registry npm endpoints.
//!
//! Artifact Registry repositories are addressed by their nerf-darted form,
//! the URL with its protocol stripped:
//!
//! ```text
//! https://us-npm.pkg.dev/my-project/my-repo/ → //us-npm.pkg.dev/my-project/my-repo/
//! ```

use regex::Regex;
use std::sync::LazyLock;

/// Pattern fragment matching a nerf-darted Artifact Registry npm endpoint.
pub(crate) const ENDPOINT_PATTERN: &str = r"//[a-zA-Z0-9\-]+-npm\.pkg\.dev/.*/";

static ENDPOINT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^{}$", ENDPOINT_PATTERN)).unwrap());

/// Check whether a nerf-darted registry is an Artifact Registry npm endpoint.
///
/// # Examples
///
/// ```
/// use npmrc_auth_rs::registry::is_artifact_registry;
///
/// assert!(is_artifact_registry("//us-npm.pkg.dev/proj/repo/"));
/// assert!(!is_artifact_registry("//registry.npmjs.org/"));
/// ```
pub fn is_artifact_registry(registry: &str) -> bool {
    ENDPOINT.is_match(registry)
}

/// Build the config key for a registry binding.
///
/// Unscoped bindings use the default `registry` key.
///
/// # Examples
///
/// ```
/// use npmrc_auth_rs::registry::scope_registry_key;
///
/// assert_eq!(scope_registry_key(Some("@myorg")), "@myorg:registry");
/// assert_eq!(scope_registry_key(None), "registry");
/// ```
pub fn scope_registry_key(scope: Option<&str>) -> String {
    match scope {
        Some(scope) => format!("{}:registry", scope),
        None => "registry".to_string(),
    }
}

/// Build the `_authToken` key for a nerf-darted registry.
pub fn auth_token_key(registry: &str) -> String {
    format!("{}:_authToken", registry)
}

/// Build the `_password` key for a nerf-darted registry.
pub fn password_key(registry: &str) -> String {
    format!("{}:_password", registry)
}
