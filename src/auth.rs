//! Access token sources.
//!
//! The token written to .npmrc is an OAuth bearer token for Artifact
//! Registry. It is either supplied directly or obtained from the
//! `gcloud` CLI of the current user.

use crate::error::{Error, Result};
use std::fmt;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tracing::debug;

/// Default deadline for fetching a token.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// An OAuth access token.
///
/// The `Debug` implementation redacts the token so it can't leak into logs.
#[derive(Clone)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap a token, rejecting blank values.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into().trim().to_string();
        if token.is_empty() {
            return Err(Error::TokenFetch("token is empty".to_string()));
        }
        Ok(AccessToken(token))
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AccessToken").field(&"[REDACTED]").finish()
    }
}

/// Something that can produce an access token before a deadline.
pub trait TokenSource: fmt::Debug {
    fn fetch(&self, timeout: Duration) -> Result<AccessToken>;
}

/// Pick the token source for an optional explicit token.
///
/// A missing or blank token means the token is fetched from gcloud.
pub fn token_source(token: Option<&str>) -> Result<Box<dyn TokenSource>> {
    match token.filter(|t| !t.trim().is_empty()) {
        Some(token) => Ok(Box::new(StaticToken::new(token)?)),
        None => Ok(Box::new(GcloudToken::new())),
    }
}

/// A token supplied up front, e.g. on the command line.
#[derive(Debug, Clone)]
pub struct StaticToken(AccessToken);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Result<Self> {
        Ok(StaticToken(AccessToken::new(token)?))
    }
}

impl TokenSource for StaticToken {
    fn fetch(&self, _timeout: Duration) -> Result<AccessToken> {
        Ok(self.0.clone())
    }
}

/// Fetches a token with `gcloud auth print-access-token`.
///
/// Unless a program is given, `gcloud` is looked up on `PATH` when a token
/// is requested.
#[derive(Debug, Clone, Default)]
pub struct GcloudToken {
    program: Option<PathBuf>,
}

impl GcloudToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific executable instead of the one on `PATH`.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        GcloudToken {
            program: Some(program.into()),
        }
    }

    fn program(&self) -> Result<PathBuf> {
        match &self.program {
            Some(program) => Ok(program.clone()),
            None => which::which("gcloud").map_err(|e| {
                Error::TokenSourceUnavailable(format!("gcloud not found on PATH: {}", e))
            }),
        }
    }
}

impl TokenSource for GcloudToken {
    fn fetch(&self, timeout: Duration) -> Result<AccessToken> {
        let program = self.program()?;
        debug!(program = %program.display(), "requesting access token from gcloud");

        let mut child = Command::new(&program)
            .args(["auth", "print-access-token"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                Error::TokenFetch(format!("failed to run {}: {}", program.display(), e))
            })?;

        let deadline = Instant::now() + timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(Error::TokenTimeout(timeout));
                }
                Ok(None) => std::thread::sleep(POLL_INTERVAL),
                Err(e) => return Err(Error::TokenFetch(e.to_string())),
            }
        };

        let mut stdout = String::new();
        if let Some(mut out) = child.stdout.take() {
            out.read_to_string(&mut stdout)
                .map_err(|e| Error::TokenFetch(e.to_string()))?;
        }

        if !status.success() {
            let mut stderr = String::new();
            if let Some(mut err) = child.stderr.take() {
                let _ = err.read_to_string(&mut stderr);
            }
            return Err(Error::TokenFetch(format!(
                "gcloud exited with {}: {}",
                status,
                stderr.trim()
            )));
        }

        AccessToken::new(stdout)
    }
}
