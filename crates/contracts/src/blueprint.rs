//! HandlerBlueprint - Config Loader output
//!
//! Describes the external tool, how the sensor is mounted, and which
//! direction queries the CLI reports.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{CardinalDirection, ContractError};

/// Slamtec RPLiDAR C1 baud rate
pub const SLAMTEC_C1_BAUD_RATE: u32 = 460_800;

/// Default serial port of the C1 on Linux
pub const LINUX_SLAMTEC_C1_PORT: &str = "/dev/ttyUSB0";

/// Banner lines printed by `ultra_simple` before any measurement
pub const DEFAULT_STARTUP_LINES: usize = 6;

/// Grace period between the interrupt signal and the hard kill
pub const DEFAULT_CLOSE_TIMEOUT_MS: u64 = 5_000;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete configuration blueprint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandlerBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// External tool and sensor mounting
    pub handler: HandlerConfig,

    /// Direction queries reported while running
    #[serde(default)]
    pub query: QueryConfig,
}

/// Handler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandlerConfig {
    /// Path to the `ultra_simple` executable
    pub ultra_simple_path: PathBuf,

    /// Serial port the sensor is attached to
    #[serde(default = "default_port")]
    pub port: String,

    /// Serial baud rate
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Sensor mounted inverted; angles are mirrored
    #[serde(default)]
    pub upside_down: bool,

    /// Degrees added to every angle after mirroring, |x| < 360
    #[serde(default)]
    pub angle_adjustment: f64,

    /// Readings farther than this (millimeters) are discarded, must be > 0
    pub max_distance_limit: f64,

    /// Number of leading primary-stream lines to discard
    #[serde(default = "default_startup_lines")]
    pub startup_lines: usize,

    /// Milliseconds to wait after the interrupt before killing the tool
    #[serde(default = "default_close_timeout_ms")]
    pub close_timeout_ms: u64,
}

fn default_port() -> String {
    LINUX_SLAMTEC_C1_PORT.to_string()
}

fn default_baud_rate() -> u32 {
    SLAMTEC_C1_BAUD_RATE
}

fn default_startup_lines() -> usize {
    DEFAULT_STARTUP_LINES
}

fn default_close_timeout_ms() -> u64 {
    DEFAULT_CLOSE_TIMEOUT_MS
}

impl HandlerConfig {
    /// Configuration with defaults for everything but the required fields
    pub fn new(ultra_simple_path: impl Into<PathBuf>, max_distance_limit: f64) -> Self {
        Self {
            ultra_simple_path: ultra_simple_path.into(),
            port: default_port(),
            baud_rate: default_baud_rate(),
            upside_down: false,
            angle_adjustment: 0.0,
            max_distance_limit,
            startup_lines: default_startup_lines(),
            close_timeout_ms: default_close_timeout_ms(),
        }
    }

    /// Preset for the Slamtec RPLiDAR C1
    pub fn slamtec_c1(
        port: impl Into<String>,
        upside_down: bool,
        angle_adjustment: f64,
        ultra_simple_path: impl Into<PathBuf>,
        max_distance_limit: f64,
    ) -> Self {
        Self {
            port: port.into(),
            baud_rate: SLAMTEC_C1_BAUD_RATE,
            upside_down,
            angle_adjustment,
            ..Self::new(ultra_simple_path, max_distance_limit)
        }
    }

    /// Arguments passed to the external tool (executable excluded)
    pub fn tool_args(&self) -> Vec<String> {
        vec![
            "--channel".to_string(),
            "--serial".to_string(),
            self.port.clone(),
            self.baud_rate.to_string(),
        ]
    }

    /// Check the fields that make construction fail
    ///
    /// Returns the first error encountered.
    pub fn validate(&self) -> Result<(), ContractError> {
        if self.ultra_simple_path.as_os_str().to_string_lossy().trim().is_empty() {
            return Err(ContractError::config_validation(
                "handler.ultra_simple_path",
                "ultra_simple path cannot be empty",
            ));
        }

        if !(self.max_distance_limit.is_finite() && self.max_distance_limit > 0.0) {
            return Err(ContractError::config_validation(
                "handler.max_distance_limit",
                format!(
                    "max distance limit must be greater than zero, got {}",
                    self.max_distance_limit
                ),
            ));
        }

        if !(self.angle_adjustment.is_finite() && self.angle_adjustment.abs() < 360.0) {
            return Err(ContractError::config_validation(
                "handler.angle_adjustment",
                format!(
                    "angle adjustment must be within (-360, 360), got {}",
                    self.angle_adjustment
                ),
            ));
        }

        if self.port.trim().is_empty() {
            return Err(ContractError::config_validation(
                "handler.port",
                "serial port cannot be empty",
            ));
        }

        Ok(())
    }
}

/// Direction queries reported by the CLI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Odd angular width of every query window
    #[serde(default = "default_width")]
    pub width: usize,

    /// Directions to report; empty means all sixteen
    #[serde(default)]
    pub directions: Vec<CardinalDirection>,

    /// Report interval in milliseconds
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

fn default_width() -> usize {
    5
}

fn default_interval_ms() -> u64 {
    1_000
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            directions: Vec::new(),
            interval_ms: default_interval_ms(),
        }
    }
}

impl QueryConfig {
    /// Directions to report, expanding the empty list to the full table
    pub fn effective_directions(&self) -> Vec<CardinalDirection> {
        if self.directions.is_empty() {
            CardinalDirection::ALL.to_vec()
        } else {
            self.directions.clone()
        }
    }
}
