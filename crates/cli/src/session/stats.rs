//! Session statistics.

use std::time::Duration;

use ingestion::MetricsSnapshot;
use observability::ReportSummary;

/// Statistics from a session
#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    /// Wall time of the session
    pub duration: Duration,

    /// Aggregated direction reports
    pub reports: ReportSummary,

    /// Handler line counters, when the handler exposes them
    pub handler_metrics: Option<MetricsSnapshot>,
}

impl SessionStats {
    /// Measurements stored per second
    pub fn measurement_rate(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        match self.handler_metrics {
            Some(metrics) if secs > 0.0 => metrics.measurements_stored as f64 / secs,
            _ => 0.0,
        }
    }

    pub fn print_summary(&self) {
        println!("\n=== Session Statistics ===\n");
        println!("Duration: {:.2}s", self.duration.as_secs_f64());

        if let Some(metrics) = self.handler_metrics {
            println!("Lines read: {}", metrics.lines_read);
            println!("  Startup lines skipped: {}", metrics.startup_lines_skipped);
            println!("  Measurements stored: {}", metrics.measurements_stored);
            println!("  Parse errors: {}", metrics.parse_errors);
            println!("  Out of range: {}", metrics.out_of_range);
            println!("Rotations: {}", metrics.rotations);
            println!("Diagnostic lines: {}", metrics.diagnostic_lines);
            println!("Measurement rate: {:.1}/s", self.measurement_rate());
        }

        println!("\n{}", self.reports);
    }
}
