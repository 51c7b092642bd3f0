//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use contracts::CardinalDirection;
use std::path::PathBuf;

/// RPLiDAR Handler - distance readings from a Slamtec RPLiDAR via ultra_simple
#[derive(Parser, Debug)]
#[command(
    name = "rplidar-handler",
    author,
    version,
    about = "RPLiDAR acquisition handler",
    long_about = "Supervises the Slamtec ultra_simple tool, keeps the latest reading\n\
                  for every degree, and reports mean distances for compass\n\
                  directions while the sensor spins."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "RPLIDAR_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "RPLIDAR_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the handler and report direction averages
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration and the direction table
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "rplidar.toml", env = "RPLIDAR_CONFIG")]
    pub config: PathBuf,

    /// Override the ultra_simple executable path
    #[arg(long, env = "RPLIDAR_ULTRA_SIMPLE")]
    pub ultra_simple: Option<PathBuf>,

    /// Override the serial port
    #[arg(long, env = "RPLIDAR_PORT")]
    pub port: Option<String>,

    /// Override the baud rate
    #[arg(long, env = "RPLIDAR_BAUD_RATE")]
    pub baud_rate: Option<u32>,

    /// Treat the sensor as mounted upside down
    #[arg(long)]
    pub upside_down: bool,

    /// Override the angle adjustment in degrees
    #[arg(long, allow_negative_numbers = true)]
    pub angle_adjustment: Option<f64>,

    /// Override the maximum accepted distance
    #[arg(long)]
    pub max_distance: Option<f64>,

    /// Override the averaging window width (odd, degrees)
    #[arg(long)]
    pub width: Option<usize>,

    /// Override the reported directions (comma separated, e.g. north,east)
    #[arg(long, value_delimiter = ',')]
    pub directions: Vec<CardinalDirection>,

    /// Override the report interval in milliseconds
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Stop after this many seconds (0 = until interrupted)
    #[arg(long, default_value = "0", env = "RPLIDAR_DURATION")]
    pub duration: u64,

    /// Validate configuration and exit without starting the tool
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "RPLIDAR_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "rplidar.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "rplidar.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show the compass direction table
    #[arg(long)]
    pub directions: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
