//! The `refresh` workflow.
//!
//! Loads the project .npmrc, binds a fresh access token to each Artifact
//! Registry registry found there and merges the result into the user
//! .npmrc.

use crate::auth::{AccessToken, TokenSource, DEFAULT_TIMEOUT};
use crate::config::NpmrcFile;
use crate::error::Result;
use crate::paths::{project_config_path, user_config_path};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

/// Options for a refresh run.
#[derive(Debug, Clone)]
pub struct RefreshOptions {
    /// Project config to read (default: `./.npmrc`).
    pub project_config: Option<PathBuf>,
    /// User config to update (default: `~/.npmrc`).
    pub user_config: Option<PathBuf>,
    /// Deadline for fetching the access token.
    pub timeout: Duration,
    /// Compute the new user config without writing it.
    pub dry_run: bool,
}

impl Default for RefreshOptions {
    fn default() -> Self {
        RefreshOptions {
            project_config: None,
            user_config: None,
            timeout: DEFAULT_TIMEOUT,
            dry_run: false,
        }
    }
}

/// Outcome of a refresh run.
#[derive(Debug, Clone)]
pub struct RefreshReport {
    /// Registries that received the new token.
    pub registries: Vec<String>,
    /// The user config that was (or would be) written.
    pub destination: PathBuf,
    /// Whether the destination was written.
    pub written: bool,
    /// The merged user config.
    pub config: NpmrcFile,
}

/// Refresh Artifact Registry tokens in the user .npmrc.
///
/// Nothing is written unless every step before the save succeeds.
pub fn refresh(opts: &RefreshOptions, source: &dyn TokenSource) -> Result<RefreshReport> {
    let project_path = match &opts.project_config {
        Some(path) => path.clone(),
        None => project_config_path(std::path::Path::new(".")),
    };
    let project = NpmrcFile::load(&project_path)?;

    let token: AccessToken = source.fetch(opts.timeout)?;
    let config = project.add_token(token.secret())?;
    let registries: Vec<String> = project
        .registries()
        .into_iter()
        .map(str::to_string)
        .collect();
    debug!(count = registries.len(), "added token to project config");

    let destination = match &opts.user_config {
        Some(path) => path.clone(),
        None => user_config_path()?,
    };

    let (config, written) = if opts.dry_run {
        (config.merged_into(&destination)?, false)
    } else {
        (config.save(&destination)?, true)
    };

    info!(
        destination = %destination.display(),
        registries = registries.len(),
        written,
        "refresh finished"
    );

    Ok(RefreshReport {
        registries,
        destination,
        written,
        config,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticToken;
    use crate::error::Error;
    use std::fs;

    #[test]
    fn test_refresh_writes_user_config() {
        let temp = tempfile::tempdir().unwrap();
        let project = temp.path().join("project.npmrc");
        let user = temp.path().join("user.npmrc");
        fs::write(&project, "registry=https://us-npm.pkg.dev/p/r/\n").unwrap();

        let opts = RefreshOptions {
            project_config: Some(project),
            user_config: Some(user.clone()),
            ..Default::default()
        };
        let report = refresh(&opts, &StaticToken::new("tok").unwrap()).unwrap();

        assert!(report.written);
        assert_eq!(report.registries, ["//us-npm.pkg.dev/p/r/"]);
        assert_eq!(
            fs::read_to_string(&user).unwrap(),
            "registry=https://us-npm.pkg.dev/p/r/\n//us-npm.pkg.dev/p/r/:_authToken=tok\n"
        );
    }

    #[test]
    fn test_refresh_dry_run() {
        let temp = tempfile::tempdir().unwrap();
        let project = temp.path().join("project.npmrc");
        let user = temp.path().join("user.npmrc");
        fs::write(&project, "registry=https://us-npm.pkg.dev/p/r/\n").unwrap();

        let opts = RefreshOptions {
            project_config: Some(project),
            user_config: Some(user.clone()),
            dry_run: true,
            ..Default::default()
        };
        let report = refresh(&opts, &StaticToken::new("tok").unwrap()).unwrap();

        assert!(!report.written);
        assert!(!user.exists());
        assert!(report.config.render().contains(":_authToken=tok"));
    }

    #[test]
    fn test_refresh_missing_project() {
        let temp = tempfile::tempdir().unwrap();
        let opts = RefreshOptions {
            project_config: Some(temp.path().join("missing.npmrc")),
            user_config: Some(temp.path().join("user.npmrc")),
            ..Default::default()
        };
        let result = refresh(&opts, &StaticToken::new("tok").unwrap());
        assert!(matches!(result, Err(Error::FileNotFound(_))));
    }
}
