//! Mock handler
//!
//! Used for testing orchestration code without an `ultra_simple` binary.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

use contracts::{HandlerError, Measurement, Scan};
use tracing::debug;

use crate::cancel::CancelToken;
use crate::handler::{LidarHandler, RunGuard, ScanQuery, StopCallback};

/// Handler serving a scan filled in by the test itself
///
/// `run` holds the running flag until cancelled, or fails immediately with
/// the configured error.
#[derive(Debug, Default)]
pub struct MockLidarHandler {
    scan: RwLock<Scan>,
    running: AtomicBool,
    fail_with: RwLock<Option<String>>,
}

impl MockLidarHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock serving the given readings
    pub fn with_measurements(measurements: impl IntoIterator<Item = Measurement>) -> Self {
        let mock = Self::new();
        for measurement in measurements {
            mock.insert(measurement);
        }
        mock
    }

    /// Store a reading in its slot
    pub fn insert(&self, measurement: Measurement) {
        self.scan
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(measurement);
    }

    pub fn clear(&self) {
        self.scan
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Make the next runs fail with a reader error carrying `message`
    pub fn fail_with(&self, message: impl Into<String>) {
        *self
            .fail_with
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(message.into());
    }
}

impl ScanQuery for MockLidarHandler {
    fn snapshot(&self) -> Scan {
        *self.scan.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LidarHandler for MockLidarHandler {
    async fn run(&self, cancel: CancelToken, on_failure: StopCallback) -> Result<(), HandlerError> {
        let _guard = RunGuard::acquire(&self.running)?;

        let failure = self
            .fail_with
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        match failure {
            Some(message) => {
                on_failure();
                Err(HandlerError::Task {
                    stream: "STDOUT",
                    message,
                })
            }
            None => {
                debug!("mock handler running");
                cancel.cancelled().await;
                Err(HandlerError::Cancelled)
            }
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use std::time::Duration;

    fn reading(angle: f64, distance: f64) -> Measurement {
        Measurement::new(angle, distance, 10, false, false, 0.0).unwrap()
    }

    #[test]
    fn test_mock_serves_queries() {
        let mock = MockLidarHandler::with_measurements([reading(90.0, 100.0), reading(91.0, 300.0)]);
        assert_eq!(mock.average_at(90, 3), Ok(200.0));
        assert_eq!(
            mock.average_for_direction(1, contracts::CardinalDirection::East),
            Ok(100.0)
        );

        mock.clear();
        assert!(mock.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_mock_runs_until_cancelled() {
        let mock = Arc::new(MockLidarHandler::new());
        let cancel = CancelToken::new();

        let task = {
            let mock = Arc::clone(&mock);
            let cancel = cancel.clone();
            tokio::spawn(async move { mock.run(cancel, Arc::new(|| {})).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(mock.is_running());

        cancel.cancel();
        let result = tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(result, Err(HandlerError::Cancelled)));
        assert!(!mock.is_running());
    }

    #[tokio::test]
    async fn test_dropped_run_releases_flag() {
        let mock = Arc::new(MockLidarHandler::new());
        let cancel = CancelToken::new();

        let task = {
            let mock = Arc::clone(&mock);
            let cancel = cancel.clone();
            tokio::spawn(async move { mock.run(cancel, Arc::new(|| {})).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(mock.is_running());

        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());
        assert!(!mock.is_running());
        assert!(!cancel.is_cancelled());

        // A fresh run can take the flag again
        let second = mock.run(cancel.clone(), Arc::new(|| {}));
        cancel.cancel();
        assert!(matches!(second.await, Err(HandlerError::Cancelled)));
    }

    #[tokio::test]
    async fn test_mock_failure_invokes_callback() {
        let mock = MockLidarHandler::new();
        mock.fail_with("boom");

        let calls = Arc::new(AtomicUsize::new(0));
        let on_failure: StopCallback = {
            let calls = Arc::clone(&calls);
            Arc::new(move || {
                calls.fetch_add(1, Ordering::SeqCst);
            })
        };

        let result = mock.run(CancelToken::new(), on_failure).await;
        assert!(matches!(result, Err(HandlerError::Task { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!mock.is_running());
    }
}
