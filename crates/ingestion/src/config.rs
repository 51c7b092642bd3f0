//! Scanner limits and ingestion metrics

use std::sync::atomic::{AtomicU64, Ordering};

use metrics::counter;

/// Initial line buffer size (1 MiB)
pub const INITIAL_BUFFER_SIZE: usize = 1024 * 1024;

/// Longest accepted line (10 MiB); anything longer is a fatal scan error
pub const MAX_BUFFER_SIZE: usize = 10 * 1024 * 1024;

/// Line scanner buffer limits
#[derive(Debug, Clone, Copy)]
pub struct ScannerConfig {
    /// Capacity reserved for the line buffer up front
    pub initial_buffer_size: usize,

    /// Longest line accepted before the scan fails
    pub max_buffer_size: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            initial_buffer_size: INITIAL_BUFFER_SIZE,
            max_buffer_size: MAX_BUFFER_SIZE,
        }
    }
}

impl ScannerConfig {
    /// Create new scanner limits
    pub fn new(initial_buffer_size: usize, max_buffer_size: usize) -> Self {
        Self {
            initial_buffer_size: initial_buffer_size.min(max_buffer_size),
            max_buffer_size,
        }
    }
}

/// Ingestion metrics
///
/// Counters are cumulative across runs; the per-run startup counter lives
/// in the handler state.
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    /// Lines read from the primary stream
    pub lines_read: AtomicU64,

    /// Banner lines discarded at startup
    pub startup_lines_skipped: AtomicU64,

    /// Measurements written into the scan
    pub measurements_stored: AtomicU64,

    /// Lines that failed to parse
    pub parse_errors: AtomicU64,

    /// Measurements discarded for distance out of range
    pub out_of_range: AtomicU64,

    /// Rotation markers seen
    pub rotations: AtomicU64,

    /// Lines read from the diagnostic stream
    pub diagnostic_lines: AtomicU64,
}

impl IngestionMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_line(&self) {
        self.lines_read.fetch_add(1, Ordering::Relaxed);
        counter!("rplidar_lines_total", "stream" => "STDOUT").increment(1);
    }

    pub fn record_startup_skipped(&self) {
        self.startup_lines_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stored(&self) {
        self.measurements_stored.fetch_add(1, Ordering::Relaxed);
        counter!("rplidar_measurements_stored_total").increment(1);
    }

    pub fn record_parse_error(&self) {
        self.parse_errors.fetch_add(1, Ordering::Relaxed);
        counter!("rplidar_parse_errors_total").increment(1);
    }

    pub fn record_out_of_range(&self) {
        self.out_of_range.fetch_add(1, Ordering::Relaxed);
        counter!("rplidar_out_of_range_total").increment(1);
    }

    pub fn record_rotation(&self) {
        self.rotations.fetch_add(1, Ordering::Relaxed);
        counter!("rplidar_rotations_total").increment(1);
    }

    pub fn record_diagnostic_line(&self) {
        self.diagnostic_lines.fetch_add(1, Ordering::Relaxed);
        counter!("rplidar_lines_total", "stream" => "STDERR").increment(1);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            lines_read: self.lines_read.load(Ordering::Relaxed),
            startup_lines_skipped: self.startup_lines_skipped.load(Ordering::Relaxed),
            measurements_stored: self.measurements_stored.load(Ordering::Relaxed),
            parse_errors: self.parse_errors.load(Ordering::Relaxed),
            out_of_range: self.out_of_range.load(Ordering::Relaxed),
            rotations: self.rotations.load(Ordering::Relaxed),
            diagnostic_lines: self.diagnostic_lines.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub lines_read: u64,
    pub startup_lines_skipped: u64,
    pub measurements_stored: u64,
    pub parse_errors: u64,
    pub out_of_range: u64,
    pub rotations: u64,
    pub diagnostic_lines: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scanner_defaults() {
        let config = ScannerConfig::default();
        assert_eq!(config.initial_buffer_size, 1024 * 1024);
        assert_eq!(config.max_buffer_size, 10 * 1024 * 1024);
    }

    #[test]
    fn test_scanner_initial_never_exceeds_max() {
        let config = ScannerConfig::new(4096, 64);
        assert_eq!(config.initial_buffer_size, 64);
    }

    #[test]
    fn test_metrics_snapshot() {
        let metrics = IngestionMetrics::new();
        metrics.record_line();
        metrics.record_line();
        metrics.record_parse_error();
        metrics.record_stored();
        metrics.record_diagnostic_line();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.lines_read, 2);
        assert_eq!(snapshot.parse_errors, 1);
        assert_eq!(snapshot.measurements_stored, 1);
        assert_eq!(snapshot.diagnostic_lines, 1);
        assert_eq!(snapshot.rotations, 0);
    }
}
