//! Handler traits - the surface orchestration code drives
//!
//! A handler owns one acquisition run at a time and answers distance
//! queries against the latest scan while that run is writing it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use contracts::{AverageError, CardinalDirection, HandlerError, Scan};

use crate::cancel::CancelToken;

/// Invoked when a stream reader fails, so the owner can tear down its
/// surrounding work. Not invoked on cancellation.
pub type StopCallback = Arc<dyn Fn() + Send + Sync>;

/// Distance queries over the handler's current scan.
///
/// Every query takes a fresh snapshot, so it never observes a half-written
/// measurement.
pub trait ScanQuery {
    /// Copy of the current scan
    fn snapshot(&self) -> Scan;

    /// Mean distance within `width` degrees centred on `middle_angle`
    fn average_at(&self, middle_angle: usize, width: usize) -> Result<f64, AverageError> {
        averaging::average_at(&self.snapshot(), middle_angle, width)
    }

    /// Like [`ScanQuery::average_at`], but an empty window is an error
    fn average_at_strict(&self, middle_angle: usize, width: usize) -> Result<f64, AverageError> {
        averaging::average_at_strict(&self.snapshot(), middle_angle, width)
    }

    fn average_for_direction(
        &self,
        width: usize,
        direction: CardinalDirection,
    ) -> Result<f64, AverageError> {
        averaging::average_for_direction(&self.snapshot(), width, direction)
    }

    /// Averages for several directions, all from the same snapshot
    fn averages_for_directions(
        &self,
        width: usize,
        directions: &[CardinalDirection],
    ) -> Result<HashMap<CardinalDirection, f64>, AverageError> {
        averaging::averages_for_directions(&self.snapshot(), width, directions)
    }

    fn averages_for_all_directions(
        &self,
        width: usize,
    ) -> Result<HashMap<CardinalDirection, f64>, AverageError> {
        averaging::averages_for_all_directions(&self.snapshot(), width)
    }
}

/// Acquisition handler
#[trait_variant::make(LidarHandler: Send)]
pub trait LocalLidarHandler: ScanQuery {
    /// Run acquisition until the source ends, `cancel` fires, or a reader
    /// fails.
    ///
    /// # Errors
    /// `HandlerError::AlreadyRunning` if a run is active,
    /// `HandlerError::Cancelled` after cancellation, or the first reader or
    /// startup failure.
    async fn run(&self, cancel: CancelToken, on_failure: StopCallback) -> Result<(), HandlerError>;

    /// Whether a run is in progress
    fn is_running(&self) -> bool;
}

/// Holds a handler's running flag; clears it however the run ends
pub(crate) struct RunGuard<'a> {
    running: &'a AtomicBool,
}

impl<'a> RunGuard<'a> {
    /// Set the flag, or fail if another run holds it
    pub(crate) fn acquire(running: &'a AtomicBool) -> Result<Self, HandlerError> {
        running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| HandlerError::AlreadyRunning)?;
        Ok(Self { running })
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}
