// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Composer Daemon (composerd)
//!
//! Loads the engine configuration, starts the engine with the built-in
//! behaviors and source kinds, and runs until SIGINT or SIGTERM.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::path::{Path, PathBuf};

use clap::Parser;
use composer_daemon::{lifecycle, LifecycleError};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

const LOG_FILE: &str = "composerd.log";

#[derive(Parser)]
#[command(name = "composerd", version, about = "Composer workflow engine daemon")]
struct Args {
    /// Engine configuration file (created with defaults when missing)
    #[arg(long, default_value = "composer.toml")]
    config: PathBuf,

    /// Validate the configuration, list its sources, and exit
    #[arg(long)]
    check: bool,

    /// Write logs to <DIR>/composerd.log instead of stderr
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), LifecycleError> {
    let args = Args::parse();

    if args.check {
        let config = lifecycle::load_config(&args.config)?;
        for line in lifecycle::summary(&config) {
            println!("{line}");
        }
        println!("config ok: {} source(s)", config.sources.len());
        return Ok(());
    }

    let _log_guard = setup_logging(args.log_dir.as_deref())?;
    info!(config = %args.config.display(), "starting composerd");

    let config = lifecycle::load_or_create_config(&args.config)?;
    let engine = match lifecycle::startup(config) {
        Ok(engine) => engine,
        Err(e) => {
            error!("Failed to start engine: {}", e);
            return Err(e);
        }
    };

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    info!("composerd ready");

    tokio::select! {
        _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        _ = sigint.recv() => info!("Received SIGINT, shutting down..."),
    }

    lifecycle::shutdown(&engine);
    info!("composerd stopped");
    Ok(())
}

/// Install the global subscriber; the returned guard flushes the file writer on drop
fn setup_logging(
    log_dir: Option<&Path>,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let file_appender = tracing_appender::rolling::never(dir, LOG_FILE);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
                .try_init()
                .map_err(|e| LifecycleError::Logging(e.to_string()))?;
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .try_init()
                .map_err(|e| LifecycleError::Logging(e.to_string()))?;
            Ok(None)
        }
    }
}
