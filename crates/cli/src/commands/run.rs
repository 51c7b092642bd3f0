//! `run` command implementation.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use contracts::HandlerBlueprint;
use ingestion::RplidarHandler;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::session::Session;

/// Execute the `run` command
pub async fn run_handler(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let mut blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    apply_overrides(&mut blueprint, args);
    config_loader::ConfigLoader::validate(&blueprint)
        .map_err(|e| CliError::config_validation(e.to_string()))?;

    info!(
        ultra_simple = %blueprint.handler.ultra_simple_path.display(),
        port = %blueprint.handler.port,
        baud_rate = blueprint.handler.baud_rate,
        upside_down = blueprint.handler.upside_down,
        angle_adjustment = blueprint.handler.angle_adjustment,
        max_distance_limit = blueprint.handler.max_distance_limit,
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
    }

    let handler = Arc::new(
        RplidarHandler::new(blueprint.handler.clone()).context("Failed to create handler")?,
    );
    let duration = (args.duration > 0).then(|| Duration::from_secs(args.duration));

    info!("Starting handler...");
    let mut stats = Session::new(Arc::clone(&handler), blueprint.query.clone(), duration)
        .run(shutdown_signal())
        .await?;

    stats.handler_metrics = Some(handler.metrics());
    info!(
        duration_secs = stats.duration.as_secs_f64(),
        reports = stats.reports.total_reports,
        measurement_rate = format!("{:.1}", stats.measurement_rate()),
        "Session completed"
    );
    stats.print_summary();

    Ok(())
}

/// Apply CLI overrides on top of the file configuration
fn apply_overrides(blueprint: &mut HandlerBlueprint, args: &RunArgs) {
    let handler = &mut blueprint.handler;
    if let Some(ref path) = args.ultra_simple {
        info!(path = %path.display(), "Overriding ultra_simple path from CLI");
        handler.ultra_simple_path = path.clone();
    }
    if let Some(ref port) = args.port {
        info!(port = %port, "Overriding serial port from CLI");
        handler.port = port.clone();
    }
    if let Some(baud_rate) = args.baud_rate {
        handler.baud_rate = baud_rate;
    }
    if args.upside_down {
        handler.upside_down = true;
    }
    if let Some(adjustment) = args.angle_adjustment {
        handler.angle_adjustment = adjustment;
    }
    if let Some(limit) = args.max_distance {
        handler.max_distance_limit = limit;
    }

    let query = &mut blueprint.query;
    if let Some(width) = args.width {
        query.width = width;
    }
    if !args.directions.is_empty() {
        query.directions = args.directions.clone();
    }
    if let Some(interval_ms) = args.interval_ms {
        query.interval_ms = interval_ms;
    }
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

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &HandlerBlueprint) {
    let handler = &blueprint.handler;
    println!("\n=== Configuration Summary ===\n");
    println!("Handler:");
    println!("  ultra_simple: {}", handler.ultra_simple_path.display());
    println!("  Serial: {} @ {} baud", handler.port, handler.baud_rate);
    println!("  Upside down: {}", handler.upside_down);
    println!("  Angle adjustment: {}", handler.angle_adjustment);
    println!("  Max distance: {}", handler.max_distance_limit);
    println!("  Startup lines skipped: {}", handler.startup_lines);

    let query = &blueprint.query;
    let directions: Vec<_> = query
        .effective_directions()
        .iter()
        .map(|d| d.name())
        .collect();
    println!("\nReports:");
    println!("  Width: {} degrees", query.width);
    println!("  Every: {} ms", query.interval_ms);
    println!("  Directions: {}", directions.join(", "));
    println!();
}
