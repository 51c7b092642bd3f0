//! # RPLiDAR Ingestion
//!
//! Acquisition supervisor for the `ultra_simple` tool.
//!
//! Responsibilities:
//! - Spawn `ultra_simple` with the configured port and baud rate
//! - Read measurement lines (stdout) and diagnostics (stderr) concurrently
//! - Keep the latest reading per whole degree in a shared `Scan`
//! - Stop the tool on cancellation or reader failure
//! - Answer averaging queries against a consistent snapshot
//!
//! ## Usage Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use contracts::{CardinalDirection, HandlerConfig};
//! use ingestion::{CancelToken, LidarHandler, RplidarHandler, ScanQuery};
//!
//! let config = HandlerConfig::slamtec_c1("/dev/ttyUSB0", false, 0.0, "/opt/ultra_simple", 4000.0);
//! let handler = Arc::new(RplidarHandler::new(config)?);
//! let cancel = CancelToken::new();
//!
//! let runner = {
//!     let handler = Arc::clone(&handler);
//!     let cancel = cancel.clone();
//!     let on_failure = { let cancel = cancel.clone(); Arc::new(move || cancel.cancel()) };
//!     tokio::spawn(async move { handler.run(cancel, on_failure).await })
//! };
//!
//! let north = handler.average_for_direction(5, CardinalDirection::North)?;
//! cancel.cancel();
//! runner.await??;
//! ```
//!
//! ## Mock Testing
//!
//! ```ignore
//! use ingestion::{MockLidarHandler, ScanQuery};
//!
//! let mock = MockLidarHandler::with_measurements(readings);
//! let avg = mock.average_at(90, 5)?;
//! ```

mod cancel;
mod config;
mod error;
mod handler;
mod mock;
mod process;
mod scanner;
mod supervisor;

// Re-exports
pub use cancel::CancelToken;
pub use config::{
    IngestionMetrics, MetricsSnapshot, ScannerConfig, INITIAL_BUFFER_SIZE, MAX_BUFFER_SIZE,
};
pub use error::{HandlerError, Result};
pub use handler::{LidarHandler, LocalLidarHandler, ScanQuery, StopCallback};
pub use mock::MockLidarHandler;
pub use scanner::{scan_lines, Stream};
pub use supervisor::{RplidarHandler, HANDLER_STARTED_MESSAGE};
