//! Periodic direction reports.

use std::collections::HashMap;
use std::fmt::Write as _;

use contracts::{CardinalDirection, QueryConfig};
use ingestion::ScanQuery;
use observability::{DirectionStatsAggregator, ReportSummary};
use tracing::{info, warn};

/// Queries the configured directions and logs one line per report
pub struct Reporter {
    width: usize,
    directions: Vec<CardinalDirection>,
    aggregator: DirectionStatsAggregator,
}

impl Reporter {
    pub fn new(query: &QueryConfig) -> Self {
        let mut directions = query.effective_directions();
        directions.sort_by(|a, b| a.angle().total_cmp(&b.angle()));
        Self {
            width: query.width,
            directions,
            aggregator: DirectionStatsAggregator::new(),
        }
    }

    /// Take one report; `None` when the query itself is invalid
    pub fn report<Q: ScanQuery>(&mut self, handler: &Q) -> Option<HashMap<CardinalDirection, f64>> {
        let averages = match handler.averages_for_directions(self.width, &self.directions) {
            Ok(averages) => averages,
            Err(e) => {
                warn!(error = %e, width = self.width, "direction query failed");
                return None;
            }
        };

        let scan = handler.snapshot();
        observability::record_direction_averages(&averages, self.width);
        observability::record_scan_coverage(&scan);
        self.aggregator.update(&averages, &scan);

        info!(
            filled_slots = scan.len(),
            width = self.width,
            "{}",
            format_averages(&self.directions, &averages)
        );
        Some(averages)
    }

    pub fn summary(&self) -> ReportSummary {
        self.aggregator.summary()
    }
}

/// `north=1200.0 east=n/a ...` in compass order
fn format_averages(
    directions: &[CardinalDirection],
    averages: &HashMap<CardinalDirection, f64>,
) -> String {
    let mut line = String::new();
    for direction in directions {
        if !line.is_empty() {
            line.push(' ');
        }
        match averages.get(direction) {
            Some(average) if !average.is_nan() => {
                let _ = write!(line, "{direction}={average:.1}");
            }
            _ => {
                let _ = write!(line, "{direction}=n/a");
            }
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Measurement;
    use ingestion::MockLidarHandler;

    #[test]
    fn test_report_uses_configured_directions() {
        let mock = MockLidarHandler::with_measurements([
            Measurement::new(0.0, 100.0, 5, false, false, 0.0).unwrap(),
            Measurement::new(180.0, 300.0, 5, false, false, 0.0).unwrap(),
        ]);
        let mut reporter = Reporter::new(&QueryConfig {
            width: 1,
            directions: vec![CardinalDirection::South, CardinalDirection::North],
            interval_ms: 100,
        });

        let averages = reporter.report(&mock).unwrap();
        assert_eq!(averages.len(), 2);
        assert_eq!(averages[&CardinalDirection::North], 100.0);
        assert_eq!(averages[&CardinalDirection::South], 300.0);
        assert_eq!(reporter.summary().total_reports, 1);
    }

    #[test]
    fn test_invalid_width_skips_report() {
        let mock = MockLidarHandler::new();
        let mut reporter = Reporter::new(&QueryConfig {
            width: 2,
            ..QueryConfig::default()
        });
        assert!(reporter.report(&mock).is_none());
        assert_eq!(reporter.summary().total_reports, 0);
    }

    #[test]
    fn test_format_marks_missing_data() {
        let directions = [CardinalDirection::North, CardinalDirection::East];
        let averages = HashMap::from([
            (CardinalDirection::North, 1234.56),
            (CardinalDirection::East, f64::NAN),
        ]);
        assert_eq!(
            format_averages(&directions, &averages),
            "north=1234.6 east=n/a"
        );
    }
}
