//! `run` command implementation.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::commands::load_settings_or_default;
use crate::workload::{Workload, WorkloadConfig};

/// Execute the `run` command
pub async fn run_workload(args: &RunArgs) -> Result<()> {
    let settings = load_settings_or_default(args.config.as_deref()).with_context(|| {
        match args.config {
            Some(ref path) => format!("Failed to load settings from {}", path.display()),
            None => "Failed to build default settings".to_string(),
        }
    })?;

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)
            .context("Failed to start metrics exporter")?;
    }

    let config = WorkloadConfig {
        units_per_category: args.units,
        work: Duration::from_millis(args.work_ms),
        panic_every: (args.panic_every != 0).then_some(args.panic_every),
        shutdown_timeout: args
            .timeout_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| settings.shutdown.timeout()),
        budget: args
            .budget
            .map(Into::into)
            .unwrap_or(settings.shutdown.budget),
        force: args.force,
        settings,
    };

    info!(
        units = config.units_per_category,
        work_ms = args.work_ms,
        timeout_ms = config.shutdown_timeout.as_millis() as u64,
        budget = ?config.budget,
        force = config.force,
        "Starting workload"
    );

    let stats = Workload::new(config)
        .run(shutdown_signal())
        .await
        .context("Workload execution failed")?;

    info!(
        completed = stats.completed(),
        panicked = stats.panicked(),
        discarded = stats.discarded(),
        rejected = stats.rejected,
        duration_secs = stats.duration.as_secs_f64(),
        throughput = format!("{:.2}", stats.throughput()),
        "Workload finished"
    );

    stats.print_summary();
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
