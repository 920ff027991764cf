mod commands;
mod error;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

use crate::commands::{convert, normalize, replay, Context};
use crate::error::{exit_code_for, report_error};
use numbook_config as config;

#[derive(Debug, Parser)]
#[command(name = "numbook", version, about = "numbook CLI")]
struct Cli {
    #[arg(long, global = true)]
    sessions_dir: Option<PathBuf>,
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    json: bool,
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Convert every .txt file in a directory into numbered .vcf batches
    Convert(convert::ConvertArgs),
    /// Print the canonical form of each number found in a file
    Normalize(normalize::NormalizeArgs),
    /// Drive conversion sessions from a JSON-lines event script
    Replay(replay::ReplayArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let verbose = cli.verbose;
    init_logging(verbose);
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err, verbose);
            exit_code_for(&err)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let Cli {
        sessions_dir,
        config: config_path,
        json,
        verbose,
        command,
    } = cli;

    let app_config = config::load(config_path.clone()).with_context(|| "load config")?;
    if verbose {
        match config::resolve_config_path(config_path) {
            Ok(path) => {
                if path.exists() {
                    debug!(path = %path.display(), "config resolved");
                } else {
                    debug!(path = %path.display(), "config missing, using defaults");
                }
            }
            Err(err) => {
                debug!(error = %err, "config unavailable");
            }
        }
    }

    let rules = app_config
        .phone
        .rules()
        .with_context(|| "invalid phone settings")?;
    let ctx = Context {
        config: &app_config,
        rules,
        sessions_dir: sessions_dir.or_else(|| app_config.sessions_dir.clone()),
        json,
    };

    match command {
        Command::Convert(args) => convert::convert(&ctx, args),
        Command::Normalize(args) => normalize::normalize(&ctx, args),
        Command::Replay(args) => replay::replay(&ctx, args),
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .try_init();
}
