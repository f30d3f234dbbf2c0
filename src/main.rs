//! brreg-export: mirrors the Norwegian business registry to a TSV artifact.
//!
//! Downloads the gzip-compressed full dataset of registered units, writes
//! one `orgnr<TAB>name` line per unit, and replaces the artifact in object
//! storage. Triggered on a schedule, on demand over HTTP, or once via
//! `--once`.

use clap::Parser;
use snafu::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use brreg_export::error::{
    AppError, AppStorageSnafu, ConfigSnafu, ExportSnafu, TaskJoinSnafu,
};
use brreg_export::{Config, ExportJob, signal, trigger};

/// Registry-to-TSV export tool.
#[derive(Parser, Debug)]
#[command(name = "brreg-export")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file.
    #[arg(short, long)]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Run a single export and exit, ignoring configured triggers.
    #[arg(long)]
    once: bool,

    /// Dry run - validate configuration without downloading.
    #[arg(long)]
    dry_run: bool,
}

#[snafu::report]
#[tokio::main]
async fn main() -> Result<(), AppError> {
    let args = Args::parse();

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!("brreg-export starting");

    let config = Config::from_file(&args.config).context(ConfigSnafu)?;

    if args.dry_run {
        info!("Dry run mode - validating configuration");
        info!("Source: {}", config.source.url);
        info!("Sink: {}/{}", config.sink.path, config.sink.artifact);
        match config.trigger.interval() {
            Some(interval) => info!("Schedule: every {}s", interval.as_secs()),
            None => info!("Schedule: disabled"),
        }
        match &config.trigger.http {
            Some(http) => info!("HTTP trigger: {}", http.address),
            None => info!("HTTP trigger: disabled"),
        }
        info!("Configuration is valid");
        return Ok(());
    }

    let job = Arc::new(ExportJob::from_config(&config).await.context(AppStorageSnafu)?);

    // Without any configured trigger there is nothing to serve; fall back
    // to a single run.
    let single_run =
        args.once || (config.trigger.interval().is_none() && config.trigger.http.is_none());
    if single_run {
        let report = job.run().await.context(ExportSnafu)?;
        info!("Export completed successfully");
        info!("  Records written: {}", report.records);
        info!("  Elapsed: {} ms", report.elapsed.as_millis());
        return Ok(());
    }

    // Serve mode: both adapters share one shutdown token, flipped by the
    // first signal.
    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            signal::shutdown_signal().await;
            shutdown.cancel();
        }
    });

    let schedule_task = config.trigger.interval().map(|interval| {
        tokio::spawn(trigger::schedule::run_schedule(
            job.clone(),
            interval,
            shutdown.clone(),
        ))
    });

    let serve_result = match config.trigger.http.clone() {
        Some(http) => trigger::http::serve(job.clone(), http, shutdown.clone()).await,
        None => {
            shutdown.cancelled().await;
            Ok(())
        }
    };

    // Stop the schedule loop even when the server exited on its own.
    shutdown.cancel();
    if let Some(handle) = schedule_task {
        handle.await.context(TaskJoinSnafu)?;
    }
    serve_result?;

    info!("brreg-export stopped");
    Ok(())
}
