//! Path resolution for .npmrc configuration files.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// File name of both the project and the user config.
pub const NPMRC_FILE_NAME: &str = ".npmrc";

/// Get the path to the project .npmrc file (`{cwd}/.npmrc`).
pub fn project_config_path(cwd: &Path) -> PathBuf {
    cwd.join(NPMRC_FILE_NAME)
}

/// Get the path to the user's .npmrc file (`~/.npmrc`).
///
/// Returns `Err(Error::HomeDirUnavailable)` if the home directory cannot be determined.
pub fn user_config_path() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(NPMRC_FILE_NAME))
        .ok_or(Error::HomeDirUnavailable)
}

/// Expand `~` at the start of a path to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}
