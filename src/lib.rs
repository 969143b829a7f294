//! Keep npm authenticated against Google Cloud Artifact Registry.
//!
//! This crate maintains the user `.npmrc` file so npm clients can talk to
//! Artifact Registry npm repositories. It provides:
//!
//! - Classification of .npmrc lines into registry bindings, auth tokens,
//!   passwords and opaque lines
//! - Binding a fresh access token to every registry of a project config
//! - Merging the result into the user config without disturbing
//!   unrelated lines
//!
//! # Quick Start
//!
//! ```no_run
//! use npmrc_auth_rs::{refresh, GcloudToken, RefreshOptions};
//!
//! let source = GcloudToken::new();
//! let report = refresh(&RefreshOptions::default(), &source)?;
//! println!("updated {}", report.destination.display());
//! # Ok::<(), npmrc_auth_rs::Error>(())
//! ```
//!
//! # Recognized Lines
//!
//! ```ini
//! @myorg:registry=https://us-npm.pkg.dev/my-project/my-repo/
//! //us-npm.pkg.dev/my-project/my-repo/:_authToken=ya29.token
//! //us-npm.pkg.dev/my-project/my-repo/:_password=cGFzc3dvcmQ=
//! ```
//!
//! Any other line is carried through unchanged.

mod auth;
mod config;
mod error;
mod parser;
mod paths;
mod refresh;
pub mod registry;

// Re-export main types
pub use auth::{
    token_source, AccessToken, GcloudToken, StaticToken, TokenSource, DEFAULT_TIMEOUT,
};
pub use config::NpmrcFile;
pub use error::{Error, Result};
pub use parser::{classify, Directive, DirectiveKind};
pub use paths::{expand_tilde, project_config_path, user_config_path, NPMRC_FILE_NAME};
pub use refresh::{refresh, RefreshOptions, RefreshReport};
