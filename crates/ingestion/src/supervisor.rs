//! RPLiDAR acquisition supervisor

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use contracts::{ContractError, HandlerConfig, Measurement, Scan};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::cancel::CancelToken;
use crate::config::{IngestionMetrics, MetricsSnapshot, ScannerConfig};
use crate::error::{HandlerError, Result};
use crate::handler::{LidarHandler, RunGuard, ScanQuery, StopCallback};
use crate::process::ToolProcess;
use crate::scanner::{scan_lines, Stream};

/// Logged once a run has spawned its readers
pub const HANDLER_STARTED_MESSAGE: &str = "RPLiDAR handler started";

/// Supervises `ultra_simple` and keeps the latest reading per degree.
///
/// One run at a time; queries are safe from any thread while a run writes.
#[derive(Debug)]
pub struct RplidarHandler {
    config: HandlerConfig,
    scanner: ScannerConfig,
    running: AtomicBool,
    state: Arc<ScanState>,
}

impl RplidarHandler {
    /// Create a handler from a validated configuration
    pub fn new(config: HandlerConfig) -> std::result::Result<Self, ContractError> {
        config.validate()?;
        Ok(Self {
            config,
            scanner: ScannerConfig::default(),
            running: AtomicBool::new(false),
            state: Arc::new(ScanState::default()),
        })
    }

    /// Override line buffer limits
    pub fn with_scanner(mut self, scanner: ScannerConfig) -> Self {
        self.scanner = scanner;
        self
    }

    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    /// Cumulative counters across all runs
    pub fn metrics(&self) -> MetricsSnapshot {
        self.state.metrics.snapshot()
    }

    fn begin_run(&self) -> Result<RunGuard<'_>> {
        RunGuard::acquire(&self.running)
    }

    async fn acquire(&self, cancel: &CancelToken, on_failure: StopCallback) -> Result<()> {
        self.state.reset();

        let (process, pipes) = ToolProcess::spawn(&self.config).await?;

        // Internal token so a failing reader can stop its sibling without
        // touching the caller's token
        let abort = CancelToken::new();
        let settings = LineSettings::from(&self.config);

        let stdout_task: JoinHandle<Result<()>> = {
            let state = Arc::clone(&self.state);
            let cancel = cancel.clone();
            let abort = abort.clone();
            let scanner = self.scanner;
            let stdout = pipes.stdout;
            tokio::spawn(async move {
                scan_lines(&cancel, &abort, Stream::Stdout, stdout, scanner, |line| {
                    state.handle_primary_line(line, &settings)
                })
                .await
            })
        };

        let stderr_task: JoinHandle<Result<()>> = {
            let state = Arc::clone(&self.state);
            let cancel = cancel.clone();
            let abort = abort.clone();
            let scanner = self.scanner;
            let stderr = pipes.stderr;
            tokio::spawn(async move {
                scan_lines(&cancel, &abort, Stream::Stderr, stderr, scanner, |line| {
                    state.handle_diagnostic_line(line)
                })
                .await
            })
        };

        info!("{}", HANDLER_STARTED_MESSAGE);

        let (stdout_result, stderr_result) = tokio::join!(
            join_reader(stdout_task, Stream::Stdout, &abort, &on_failure),
            join_reader(stderr_task, Stream::Stderr, &abort, &on_failure),
        );

        let shutdown = process
            .shutdown(Duration::from_millis(self.config.close_timeout_ms))
            .await;

        let readers = merge_results(stdout_result, stderr_result);
        match (readers, shutdown) {
            (Err(e), Err(shutdown_err)) => {
                warn!(error = %shutdown_err, "failed to stop ultra_simple cleanly");
                Err(e)
            }
            (Err(e), Ok(())) | (Ok(()), Err(e)) => Err(e),
            (Ok(()), Ok(())) => Ok(()),
        }
    }
}

impl ScanQuery for RplidarHandler {
    fn snapshot(&self) -> Scan {
        self.state.snapshot()
    }
}

impl LidarHandler for RplidarHandler {
    #[instrument(
        name = "rplidar_handler_run",
        skip_all,
        fields(port = %self.config.port, baud_rate = self.config.baud_rate)
    )]
    async fn run(&self, cancel: CancelToken, on_failure: StopCallback) -> Result<()> {
        let _guard = self.begin_run()?;

        let result = self.acquire(&cancel, on_failure).await;
        match &result {
            Ok(()) => info!("ultra_simple output ended"),
            Err(e) if e.is_cancelled() => info!("handler run cancelled"),
            Err(e) => warn!(error = %e, "handler run failed"),
        }
        result
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

/// Per-line settings copied out of the config for the reader task
#[derive(Debug, Clone, Copy)]
struct LineSettings {
    upside_down: bool,
    angle_adjustment: f64,
    max_distance_limit: f64,
    startup_lines: usize,
}

impl From<&HandlerConfig> for LineSettings {
    fn from(config: &HandlerConfig) -> Self {
        Self {
            upside_down: config.upside_down,
            angle_adjustment: config.angle_adjustment,
            max_distance_limit: config.max_distance_limit,
            startup_lines: config.startup_lines,
        }
    }
}

/// State shared between the reader tasks and queries
#[derive(Debug, Default)]
struct ScanState {
    scan: RwLock<Scan>,
    /// Primary lines seen in the current run
    lines_read: AtomicUsize,
    metrics: IngestionMetrics,
}

impl ScanState {
    fn reset(&self) {
        self.scan
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.lines_read.store(0, Ordering::Relaxed);
    }

    fn snapshot(&self) -> Scan {
        *self.scan.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn handle_primary_line(&self, line: &str, settings: &LineSettings) {
        let seen = self.lines_read.fetch_add(1, Ordering::Relaxed) + 1;
        self.metrics.record_line();

        if seen <= settings.startup_lines {
            debug!(line, "skipping startup line");
            self.metrics.record_startup_skipped();
            return;
        }

        let measurement =
            match Measurement::parse(line, settings.upside_down, settings.angle_adjustment) {
                Ok(measurement) => measurement,
                Err(e) => {
                    warn!(error = %e, line, "failed to parse measurement");
                    self.metrics.record_parse_error();
                    return;
                }
            };

        if measurement.is_rotation_marker() {
            info!("full rotation completed");
            self.metrics.record_rotation();
        }

        if !(0.0..=settings.max_distance_limit).contains(&measurement.distance()) {
            self.metrics.record_out_of_range();
            return;
        }

        self.scan
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(measurement);
        self.metrics.record_stored();
    }

    fn handle_diagnostic_line(&self, line: &str) {
        warn!(stream = Stream::Stderr.tag(), line, "ultra_simple diagnostic");
        self.metrics.record_diagnostic_line();
    }
}

/// Await a reader; on failure stop its sibling and notify the owner
async fn join_reader(
    handle: JoinHandle<Result<()>>,
    stream: Stream,
    abort: &CancelToken,
    on_failure: &StopCallback,
) -> Result<()> {
    let result = match handle.await {
        Ok(result) => result,
        Err(e) => Err(HandlerError::Task {
            stream: stream.tag(),
            message: e.to_string(),
        }),
    };

    if let Err(e) = &result {
        if !e.is_cancelled() {
            warn!(stream = stream.tag(), error = %e, "error reading lines, stopping run");
            abort.cancel();
            on_failure();
        }
    }
    result
}

/// First real failure wins over cancellation, which wins over success
fn merge_results(first: Result<()>, second: Result<()>) -> Result<()> {
    match (first, second) {
        (Err(e), _) if !e.is_cancelled() => Err(e),
        (_, Err(e)) if !e.is_cancelled() => Err(e),
        (Err(e), _) | (_, Err(e)) => Err(e),
        (Ok(()), Ok(())) => Ok(()),
    }
}
