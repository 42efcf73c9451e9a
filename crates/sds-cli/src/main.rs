use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "sds-sync")]
#[command(about = "Sync student roster attributes into Active Directory", long_about = None)]
struct Cli {
    /// Roster CSV exported from the student information system
    input: PathBuf,

    /// Config overrides merged over the built-in defaults, in order
    #[arg(long = "config")]
    config_paths: Vec<String>,

    /// Academic term printed into homeroom descriptions (e.g. 24-25)
    #[arg(long)]
    term: Option<String>,

    /// Append-mode log file (default: logging.file from config)
    #[arg(long = "log-file")]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // dev-time convenience; absent in production
    let _ = dotenvy::from_filename(".env.local");

    // Config is loaded before logging so the log file can come from it. A
    // broken config still gets logged, to the default file.
    let loaded = commands::load_config(&cli.config_paths);
    let log_file = cli
        .log_file
        .clone()
        .or_else(|| {
            loaded
                .as_ref()
                .ok()
                .and_then(|l| commands::configured_log_file(&l.config_json))
        })
        .unwrap_or_else(|| PathBuf::from(commands::DEFAULT_LOG_FILE));
    init_tracing(&log_file)?;

    let result = match loaded {
        Ok(loaded) => {
            commands::sync::run(commands::sync::SyncArgs {
                input: &cli.input,
                loaded: &loaded,
                term: cli.term.as_deref(),
            })
            .await
        }
        Err(e) => Err(e),
    };

    if let Err(e) = &result {
        error!("{e:#}");
    }
    result
}

/// stderr plus an append-only file without ANSI. `RUST_LOG` overrides the
/// default `info` level.
fn init_tracing(log_file: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("open log file failed: {}", log_file.display()))?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .init();
    Ok(())
}
