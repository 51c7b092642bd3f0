//! Direction report metrics
//!
//! Gauges for the latest averages plus in-memory statistics per direction.

use std::collections::HashMap;
use std::fmt;

use contracts::{CardinalDirection, Scan, SLOT_COUNT};
use metrics::{counter, gauge, histogram};

/// Record one direction average.
///
/// `NaN` means the window had no usable reading and is counted rather than
/// set on the gauge.
pub fn record_direction_average(direction: CardinalDirection, width: usize, average: f64) {
    if average.is_nan() {
        counter!("rplidar_direction_no_data_total", "direction" => direction.name()).increment(1);
        return;
    }

    gauge!(
        "rplidar_direction_average_mm",
        "direction" => direction.name(),
        "width" => width.to_string()
    )
    .set(average);
    histogram!("rplidar_direction_average_mm_hist", "direction" => direction.name())
        .record(average);
}

/// Record a full report
pub fn record_direction_averages(averages: &HashMap<CardinalDirection, f64>, width: usize) {
    counter!("rplidar_reports_total").increment(1);
    for (&direction, &average) in averages {
        record_direction_average(direction, width, average);
    }
}

/// Record how many of the 360 slots hold a reading
pub fn record_scan_coverage(scan: &Scan) {
    let filled = scan.len();
    gauge!("rplidar_scan_slots_filled").set(filled as f64);
    gauge!("rplidar_scan_coverage_ratio").set(filled as f64 / SLOT_COUNT as f64);
}

/// Direction statistics aggregator
///
/// Aggregates successive reports in memory for an end-of-run summary.
#[derive(Debug, Clone, Default)]
pub struct DirectionStatsAggregator {
    /// Reports seen
    pub total_reports: u64,

    /// Averages per direction, `NaN` excluded
    pub direction_stats: HashMap<CardinalDirection, RunningStats>,

    /// Reports per direction where the window had no usable reading
    pub no_data_counts: HashMap<CardinalDirection, u64>,

    /// Filled slot count per report
    pub coverage_stats: RunningStats,
}

impl DirectionStatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one report into the statistics
    pub fn update(&mut self, averages: &HashMap<CardinalDirection, f64>, scan: &Scan) {
        self.total_reports += 1;
        self.coverage_stats.push(scan.len() as f64);

        for (&direction, &average) in averages {
            if average.is_nan() {
                *self.no_data_counts.entry(direction).or_insert(0) += 1;
            } else {
                self.direction_stats
                    .entry(direction)
                    .or_default()
                    .push(average);
            }
        }
    }

    /// Generate a summary report
    pub fn summary(&self) -> ReportSummary {
        let mut directions: Vec<_> = self
            .direction_stats
            .iter()
            .map(|(&direction, stats)| (direction, StatsSummary::from(stats)))
            .collect();
        directions.sort_by(|a, b| a.0.angle().total_cmp(&b.0.angle()));

        ReportSummary {
            total_reports: self.total_reports,
            coverage: StatsSummary::from(&self.coverage_stats),
            directions,
            no_data_counts: self.no_data_counts.clone(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Report summary
#[derive(Debug, Clone, Default)]
pub struct ReportSummary {
    pub total_reports: u64,
    /// Filled slots per report
    pub coverage: StatsSummary,
    /// Per-direction averages, ordered by compass angle
    pub directions: Vec<(CardinalDirection, StatsSummary)>,
    pub no_data_counts: HashMap<CardinalDirection, u64>,
}

impl fmt::Display for ReportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Direction Report Summary ===")?;
        writeln!(f, "Reports: {}", self.total_reports)?;
        writeln!(f, "Filled slots: {}", self.coverage)?;

        for (direction, stats) in &self.directions {
            writeln!(f, "  {:<16} {}", direction.name(), stats)?;
        }

        if !self.no_data_counts.is_empty() {
            writeln!(f, "Reports without data:")?;
            for (direction, count) in &self.no_data_counts {
                writeln!(f, "  {}: {}", direction, count)?;
            }
        }

        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.1}, max={:.1}, mean={:.1}, std={:.1} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Measurement;

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for value in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(value);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_separates_no_data() {
        let mut aggregator = DirectionStatsAggregator::new();
        let mut scan = Scan::empty();
        scan.insert(Measurement::new(90.0, 500.0, 3, false, false, 0.0).unwrap());

        let report = HashMap::from([
            (CardinalDirection::East, 500.0),
            (CardinalDirection::West, f64::NAN),
        ]);
        aggregator.update(&report, &scan);
        aggregator.update(&report, &scan);

        assert_eq!(aggregator.total_reports, 2);
        assert_eq!(aggregator.direction_stats[&CardinalDirection::East].count(), 2);
        assert!(!aggregator.direction_stats.contains_key(&CardinalDirection::West));
        assert_eq!(aggregator.no_data_counts.get(&CardinalDirection::West), Some(&2));
        assert_eq!(aggregator.coverage_stats.mean(), 1.0);

        aggregator.reset();
        assert_eq!(aggregator.total_reports, 0);
    }

    #[test]
    fn test_summary_orders_by_angle() {
        let mut aggregator = DirectionStatsAggregator::new();
        let report = HashMap::from([
            (CardinalDirection::West, 1.0),
            (CardinalDirection::North, 2.0),
            (CardinalDirection::East, 3.0),
        ]);
        aggregator.update(&report, &Scan::empty());

        let summary = aggregator.summary();
        let order: Vec<_> = summary.directions.iter().map(|(d, _)| *d).collect();
        assert_eq!(
            order,
            vec![
                CardinalDirection::North,
                CardinalDirection::East,
                CardinalDirection::West
            ]
        );

        let output = summary.to_string();
        assert!(output.contains("Reports: 1"));
        assert!(output.contains("mean=3.0"));
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        let averages = HashMap::from([(CardinalDirection::North, f64::NAN)]);
        record_direction_averages(&averages, 5);
        record_scan_coverage(&Scan::empty());
    }
}
