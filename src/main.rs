use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use npmrc_auth_rs::{expand_tilde, refresh, token_source, RefreshOptions};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Update your user .npmrc file to work with Google Cloud Artifact Registry npm repositories"
)]
struct Cli {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Refresh OAuth tokens for Artifact Registry npm endpoints
    Refresh {
        /// The OAuth token to write to the npmrc file. Most users should not
        /// set this and let the tool get credentials from gcloud.
        #[arg(long)]
        token: Option<String>,
        /// Project config to read
        #[arg(long, default_value = ".npmrc")]
        project_config: PathBuf,
        /// User config to update (defaults to ~/.npmrc)
        #[arg(long)]
        user_config: Option<PathBuf>,
        /// Seconds to wait for an access token
        #[arg(long, default_value_t = 30)]
        timeout: u64,
        /// Print the new user config instead of writing it
        #[arg(long)]
        dry_run: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_tracing(cli.verbose) {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    let Some(command) = cli.command else {
        let _ = Cli::command().print_help();
        return ExitCode::SUCCESS;
    };

    match run(command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Refresh {
            token,
            project_config,
            user_config,
            timeout,
            dry_run,
        } => {
            let source = token_source(token.as_deref())?;

            let opts = RefreshOptions {
                project_config: Some(expand_tilde(&project_config)),
                user_config: user_config.as_deref().map(expand_tilde),
                timeout: Duration::from_secs(timeout),
                dry_run,
            };

            let report = refresh(&opts, source.as_ref()).context("refresh failed")?;
            if dry_run {
                print!("{}", report.config.render());
            }
            tracing::info!("Refresh completed.");
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .context("building log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}
