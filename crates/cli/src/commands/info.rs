//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{CardinalDirection, HandlerBlueprint};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;
use crate::error::CliError;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    handler: HandlerInfo,
    query: QueryInfo,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    direction_table: Vec<DirectionInfo>,
}

#[derive(Serialize)]
struct HandlerInfo {
    ultra_simple_path: String,
    command_line: String,
    upside_down: bool,
    angle_adjustment: f64,
    max_distance_limit: f64,
    startup_lines: usize,
    close_timeout_ms: u64,
}

#[derive(Serialize)]
struct QueryInfo {
    width: usize,
    interval_ms: u64,
    directions: Vec<CardinalDirection>,
}

#[derive(Serialize)]
struct DirectionInfo {
    direction: CardinalDirection,
    angle: f64,
    slot: usize,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let info = build_config_info(&blueprint, args);
    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

fn build_config_info(blueprint: &HandlerBlueprint, args: &InfoArgs) -> ConfigInfo {
    let handler = &blueprint.handler;
    let mut command_line = vec![handler.ultra_simple_path.display().to_string()];
    command_line.extend(handler.tool_args());

    let direction_table = if args.directions {
        direction_table()
    } else {
        Vec::new()
    };

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        handler: HandlerInfo {
            ultra_simple_path: handler.ultra_simple_path.display().to_string(),
            command_line: command_line.join(" "),
            upside_down: handler.upside_down,
            angle_adjustment: handler.angle_adjustment,
            max_distance_limit: handler.max_distance_limit,
            startup_lines: handler.startup_lines,
            close_timeout_ms: handler.close_timeout_ms,
        },
        query: QueryInfo {
            width: blueprint.query.width,
            interval_ms: blueprint.query.interval_ms,
            directions: blueprint.query.effective_directions(),
        },
        direction_table,
    }
}

/// All sixteen directions with the slot their window is centred on
fn direction_table() -> Vec<DirectionInfo> {
    let mut table: Vec<_> = CardinalDirection::ALL
        .iter()
        .map(|&direction| DirectionInfo {
            direction,
            angle: direction.angle(),
            slot: averaging::direction_slot(direction),
        })
        .collect();
    table.sort_by(|a, b| a.angle.total_cmp(&b.angle));
    table
}

fn print_config_info(info: &ConfigInfo) {
    println!("\n=== RPLiDAR Handler Configuration ===\n");
    println!("Version: {}", info.version);

    println!("\nHandler:");
    println!("  Command: {}", info.handler.command_line);
    println!("  Upside down: {}", info.handler.upside_down);
    println!("  Angle adjustment: {}", info.handler.angle_adjustment);
    println!("  Max distance: {}", info.handler.max_distance_limit);
    println!("  Startup lines: {}", info.handler.startup_lines);
    println!("  Close timeout: {} ms", info.handler.close_timeout_ms);

    let names: Vec<_> = info.query.directions.iter().map(|d| d.name()).collect();
    println!("\nReports:");
    println!("  Width: {} degrees", info.query.width);
    println!("  Interval: {} ms", info.query.interval_ms);
    println!("  Directions: {}", names.join(", "));

    if !info.direction_table.is_empty() {
        println!("\nDirection table:");
        for entry in &info.direction_table {
            println!(
                "  {:<16} {:>6.1} deg -> slot {}",
                entry.direction.name(),
                entry.angle,
                entry.slot
            );
        }
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{HandlerConfig, QueryConfig};

    #[test]
    fn test_direction_table_is_ordered() {
        let table = direction_table();
        assert_eq!(table.len(), 16);
        assert_eq!(table[0].direction, CardinalDirection::North);
        assert_eq!(table[15].direction, CardinalDirection::NorthNorthwest);
        assert_eq!(table[15].slot, 338);
        assert!(table.windows(2).all(|w| w[0].angle < w[1].angle));
    }

    #[test]
    fn test_build_info_command_line() {
        let blueprint = HandlerBlueprint {
            version: Default::default(),
            handler: HandlerConfig::slamtec_c1("/dev/ttyUSB0", false, 0.0, "/opt/ultra_simple", 4000.0),
            query: QueryConfig::default(),
        };
        let args = InfoArgs {
            config: "rplidar.toml".into(),
            json: true,
            directions: false,
        };

        let info = build_config_info(&blueprint, &args);
        assert_eq!(
            info.handler.command_line,
            "/opt/ultra_simple --channel --serial /dev/ttyUSB0 460800"
        );
        assert!(info.direction_table.is_empty());
        assert_eq!(info.query.directions.len(), 16);
    }
}
