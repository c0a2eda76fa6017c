//! Escrow CLI - runs one registry operation against the configured ledger.
//!
//! ```text
//! main() -> EscrowConfig::load() -> init_tracing() -> open_ledger() -> invoke()
//!                                                                        |
//!                                                                        v
//!                                                     payload on stdout | error on stderr
//! ```
//!
//! Stdout carries only operation payloads; diagnostics go to the log file.

use anyhow::{Context, Result};
use std::{
    env,
    fs::{self, OpenOptions},
    io::{Write, stdout},
    path::PathBuf,
    process::ExitCode,
    sync::Mutex,
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use escrow_config::{ConfigError, EscrowConfig, LedgerBackend};
use escrow_core::{Operation, invoke};
use escrow_ledger::{Ledger, MemoryLedger, SqliteLedger};

fn init_tracing(default_level: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (log_file, init_warnings) = open_escrow_log_file();

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();

        tracing::debug!(path = %log_path.display(), "Logging initialized");
        for warning in init_warnings {
            tracing::warn!("{warning}");
        }
        return;
    }

    // Without a log file, stay silent rather than mixing logs into payloads.
    tracing_subscriber::registry().with(env_filter).init();
}

fn open_escrow_log_file() -> (Option<(PathBuf, std::fs::File)>, Vec<String>) {
    let mut warnings = Vec::new();

    for candidate in escrow_log_file_candidates() {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!(
                "Failed to create log dir {}: {e}",
                parent.display()
            ));
            continue;
        }

        match OpenOptions::new()
            .create(true)
            .append(true)
            .open(&candidate)
        {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(e) => {
                warnings.push(format!(
                    "Failed to open log file {}: {e}",
                    candidate.display()
                ));
            }
        }
    }

    (None, warnings)
}

fn escrow_log_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    // Primary: next to the config file, normally ~/.escrow/logs/escrow.log
    if let Some(config_path) = escrow_config::config_path()
        && let Some(config_dir) = config_path.parent()
    {
        candidates.push(config_dir.join("logs").join("escrow.log"));
    }

    candidates.push(PathBuf::from(".escrow").join("logs").join("escrow.log"));

    candidates
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Help,
    Invoke { operation: String, args: Vec<String> },
}

impl Command {
    fn parse(mut argv: impl Iterator<Item = String>) -> Option<Self> {
        let first = argv.next()?;
        if matches!(first.as_str(), "-h" | "--help" | "help") {
            return Some(Command::Help);
        }
        Some(Command::Invoke {
            operation: first,
            args: argv.collect(),
        })
    }
}

fn usage() -> String {
    let mut text = String::from("Usage: escrow <operation> [args...]\n\nOperations:\n");
    for op in Operation::ALL {
        text.push_str(&format!("  {:<16} {}\n", op.as_str(), op.usage()));
    }
    text.push_str("\nConfig: ~/.escrow/config.toml (override with $ESCROW_CONFIG)\n");
    text
}

fn open_ledger(config: &EscrowConfig) -> Result<Box<dyn Ledger>> {
    match config.backend() {
        LedgerBackend::Memory => {
            tracing::warn!("Using in-memory ledger; state is discarded on exit");
            Ok(Box::new(MemoryLedger::new()))
        }
        LedgerBackend::Sqlite => {
            let path = config
                .ledger_path()
                .context("Could not determine ledger path (no home directory)")?;
            let ledger = SqliteLedger::open(&path)
                .with_context(|| format!("Failed to open ledger at {}", path.display()))?;
            Ok(Box::new(ledger))
        }
    }
}

fn run(config: &EscrowConfig, operation: &str, args: &[String]) -> Result<()> {
    let mut ledger = open_ledger(config)?;
    let payload = invoke(ledger.as_mut(), operation, args)?;

    let mut out = stdout().lock();
    if !payload.is_empty() {
        out.write_all(&payload)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

/// Settle the config loaded before logging existed. Must run after
/// `init_tracing` so a bad config file is recorded in the log.
fn resolve_config(
    loaded: Result<Option<EscrowConfig>, ConfigError>,
) -> Result<EscrowConfig, ConfigError> {
    match loaded {
        Ok(Some(config)) => Ok(config),
        Ok(None) => {
            tracing::debug!("No config file found; using defaults");
            Ok(EscrowConfig::default())
        }
        Err(err) => {
            tracing::error!(path = %err.path().display(), "Config rejected: {err}");
            Err(err)
        }
    }
}

fn main() -> ExitCode {
    let Some(command) = Command::parse(env::args().skip(1)) else {
        eprint!("{}", usage());
        return ExitCode::FAILURE;
    };

    let (operation, args) = match command {
        Command::Help => {
            print!("{}", usage());
            return ExitCode::SUCCESS;
        }
        Command::Invoke { operation, args } => (operation, args),
    };

    let loaded = EscrowConfig::load();
    let level = loaded
        .as_ref()
        .ok()
        .and_then(Option::as_ref)
        .and_then(EscrowConfig::log_level)
        .unwrap_or("info")
        .to_string();
    init_tracing(&level);

    let config = match resolve_config(loaded) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(%operation, args = args.len(), "Starting escrow invocation");
    match run(&config, &operation, &args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::warn!("{operation} failed: {err:#}");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
