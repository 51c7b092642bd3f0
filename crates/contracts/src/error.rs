//! Layered error definitions
//!
//! Categorized by source: config / line parse / averaging query / handler run

use std::path::PathBuf;

use thiserror::Error;

/// Configuration error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Failure to turn one line of the external tool's output into a measurement
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// Wrong number of fields after the optional rotation marker
    #[error("expected 3 fields, got {found}")]
    MalformedLine { found: usize },

    /// A field did not parse as its numeric type
    #[error("failed to parse {field} from '{value}': {message}")]
    FieldParse {
        field: &'static str,
        value: String,
        message: String,
    },

    /// Angle outside the range allowed for its marker state
    #[error("{}", invalid_angle_message(.angle, .rotation_marker))]
    InvalidAngle { angle: f64, rotation_marker: bool },
}

fn invalid_angle_message(angle: &f64, rotation_marker: &bool) -> String {
    if *rotation_marker {
        format!("angle with rotation marker must be in [0, 720), got {angle}")
    } else {
        format!("angle without rotation marker must be in [0, 360), got {angle}")
    }
}

/// Averaging query errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AverageError {
    #[error("angle width must be odd, got {width}")]
    WidthNotOdd { width: usize },

    #[error("angle width must be greater than 0, got {width}")]
    WidthTooSmall { width: usize },

    #[error("angle width must be less than 360 degrees, got {width}")]
    WidthTooLarge { width: usize },

    /// No usable reading inside the window (strict queries only)
    #[error("no usable measurement within {width} degrees of {middle_angle}")]
    NoData { middle_angle: usize, width: usize },
}

/// Errors surfaced by a handler run
#[derive(Debug, Error)]
pub enum HandlerError {
    /// `run` was called while another run is active
    #[error("handler is already running")]
    AlreadyRunning,

    #[error("ultra_simple executable not found at path: {}", path.display())]
    ExecutableNotFound { path: PathBuf },

    #[error("failed to start '{}': {source}", path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{stream} pipe unavailable")]
    MissingPipe { stream: &'static str },

    /// A single line exceeded the scanner's maximum buffer
    #[error("{stream} line exceeds {limit} bytes")]
    LineTooLong { stream: &'static str, limit: usize },

    #[error("{stream} read error: {source}")]
    Read {
        stream: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// A stream task panicked or was aborted
    #[error("{stream} reader task failed: {message}")]
    Task {
        stream: &'static str,
        message: String,
    },

    /// The run was cancelled through its token
    #[error("handler run cancelled")]
    Cancelled,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl HandlerError {
    /// True when the run stopped because its token was cancelled
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
