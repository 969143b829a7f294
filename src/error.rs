//! Error types for npmrc-auth-rs.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while refreshing npmrc credentials.
#[derive(Error, Debug)]
pub enum Error {
    /// Config file not found.
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    /// Failed to read a config file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a config file.
    #[error("failed to write config file {path}: {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The project config has no Artifact Registry registry lines.
    #[error("no Artifact Registry registry found in npmrc config")]
    NoRegistryFound,

    /// The token provider failed.
    #[error("failed to fetch access token: {0}")]
    TokenFetch(String),

    /// The token provider did not answer before the deadline.
    #[error("timed out after {0:?} waiting for access token")]
    TokenTimeout(Duration),

    /// No token provider could be located.
    #[error("no access token source available: {0}")]
    TokenSourceUnavailable(String),

    /// The home directory could not be determined.
    #[error("unable to determine the user home directory")]
    HomeDirUnavailable,
}

/// Result type alias for npmrc-auth-rs operations.
pub type Result<T> = std::result::Result<T, Error>;
