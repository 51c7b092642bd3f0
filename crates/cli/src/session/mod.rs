//! Acquisition session - runs a handler and reports while it spins.

mod reporter;
mod stats;

pub use reporter::Reporter;
pub use stats::SessionStats;

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use contracts::{HandlerError, QueryConfig};
use ingestion::{CancelToken, LidarHandler, StopCallback};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::error::CliError;

/// Runs one handler until it stops, the duration elapses, or `shutdown`
/// resolves
pub struct Session<H> {
    handler: Arc<H>,
    query: QueryConfig,
    duration: Option<Duration>,
}

impl<H> Session<H>
where
    H: LidarHandler + Sync + 'static,
{
    pub fn new(handler: Arc<H>, query: QueryConfig, duration: Option<Duration>) -> Self {
        Self {
            handler,
            query,
            duration,
        }
    }

    /// Run to completion
    ///
    /// # Errors
    /// The handler's run error, unless the session itself cancelled it.
    pub async fn run<S>(self, shutdown: S) -> Result<SessionStats>
    where
        S: Future<Output = ()>,
    {
        let start_time = Instant::now();
        let cancel = CancelToken::new();

        let on_failure: StopCallback = {
            let cancel = cancel.clone();
            Arc::new(move || cancel.cancel())
        };

        let mut run_task = {
            let handler = Arc::clone(&self.handler);
            let cancel = cancel.clone();
            tokio::spawn(async move { handler.run(cancel, on_failure).await })
        };

        let mut reporter = Reporter::new(&self.query);
        let mut ticker = tokio::time::interval(Duration::from_millis(self.query.interval_ms.max(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick fires immediately, before any reading exists
        ticker.tick().await;

        let duration = self.duration;
        let deadline = async move {
            match duration {
                Some(duration) => tokio::time::sleep(duration).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(deadline);
        tokio::pin!(shutdown);

        let finished = loop {
            tokio::select! {
                joined = &mut run_task => break Some(joined),
                _ = &mut shutdown => {
                    warn!("Received shutdown signal, stopping handler...");
                    break None;
                }
                _ = &mut deadline => {
                    info!("Run duration elapsed, stopping handler");
                    break None;
                }
                _ = ticker.tick() => {
                    reporter.report(self.handler.as_ref());
                }
            }
        };

        cancel.cancel();
        let joined = match finished {
            Some(joined) => joined,
            None => run_task.await,
        };

        match joined {
            Ok(Ok(())) => info!("Handler finished"),
            Ok(Err(HandlerError::Cancelled)) => info!("Handler stopped"),
            Ok(Err(e)) => return Err(CliError::Handler(e).into()),
            Err(e) => {
                return Err(CliError::HandlerTask {
                    message: e.to_string(),
                }
                .into())
            }
        }

        Ok(SessionStats {
            duration: start_time.elapsed(),
            reports: reporter.summary(),
            handler_metrics: None,
        })
    }
}
