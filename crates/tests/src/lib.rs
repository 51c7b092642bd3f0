//! # Integration Tests
//!
//! End-to-end tests against a scripted stand-in for `ultra_simple`.
//!
//! Covers:
//! - Config file to running handler
//! - Banner skipping, parsing, filtering and slot storage
//! - Cancellation, forced shutdown, reader failure
//! - Concurrent queries while a run writes

#[cfg(test)]
mod contract_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use ingestion::RplidarHandler;

    #[test]
    fn test_loaded_config_builds_handler() {
        let blueprint = ConfigLoader::load_from_str(
            r#"
[handler]
ultra_simple_path = "/opt/rplidar/ultra_simple"
max_distance_limit = 4000.0
"#,
            ConfigFormat::Toml,
        )
        .unwrap();

        let handler = RplidarHandler::new(blueprint.handler).unwrap();
        assert_eq!(handler.config().baud_rate, contracts::SLAMTEC_C1_BAUD_RATE);
    }
}

#[cfg(all(test, unix))]
mod support {
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;

    use contracts::HandlerConfig;
    use tempfile::TempDir;

    /// Executable shell script standing in for `ultra_simple`
    pub struct FakeTool {
        pub dir: TempDir,
        pub path: PathBuf,
    }

    impl FakeTool {
        pub fn new(body: &str) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("ultra_simple");
            std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            Self { dir, path }
        }

        /// Default config pointing at this script
        pub fn config(&self) -> HandlerConfig {
            let mut config = HandlerConfig::new(&self.path, 4000.0);
            config.close_timeout_ms = 500;
            config
        }
    }

    /// Six banner lines, as printed by the real tool
    pub const BANNER: &str = r#"echo "Ultra simple LIDAR data grabber for SLAMTEC LIDAR."
echo "Version: 1.12.0"
echo "SLAMTEC LIDAR S/N: 0000000000000000000000000000"
echo "Firmware Ver: 1.01"
echo "Hardware Rev: 18"
echo "SLAMTEC Lidar health status : 0""#;

    /// Emits readings forever, exits cleanly on SIGINT
    pub const ENDLESS: &str = r#"trap 'exit 0' INT
i=0
while true; do
  echo "$i 100 10"
  i=$(( (i + 1) % 360 ))
  sleep 0.02
done"#;
}

#[cfg(all(test, unix))]
mod e2e_tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use contracts::{CardinalDirection, HandlerError};
    use ingestion::{
        CancelToken, LidarHandler, RplidarHandler, ScanQuery, ScannerConfig, StopCallback,
    };

    use crate::support::{FakeTool, BANNER, ENDLESS};

    const TEST_TIMEOUT: Duration = Duration::from_secs(10);

    fn noop() -> StopCallback {
        Arc::new(|| {})
    }

    fn counting() -> (StopCallback, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let callback: StopCallback = {
            let calls = Arc::clone(&calls);
            Arc::new(move || {
                calls.fetch_add(1, Ordering::SeqCst);
            })
        };
        (callback, calls)
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        let deadline = Instant::now() + TEST_TIMEOUT;
        while !condition() {
            assert!(Instant::now() < deadline, "condition not reached in time");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    /// Banner is skipped, good lines stored, bad lines counted, stderr only logged
    #[tokio::test]
    async fn test_finite_output_fills_scan() {
        let tool = FakeTool::new(&format!(
            r#"{BANNER}
echo "S 0.5 1000 47"
echo "90.2 500 47"
echo "not a measurement"
echo "180 99999 47"
echo "270.9 0 0"
echo "lidar warming up" >&2
exit 0"#
        ));
        let handler = RplidarHandler::new(tool.config()).unwrap();
        let (on_failure, calls) = counting();

        let result = tokio::time::timeout(TEST_TIMEOUT, handler.run(CancelToken::new(), on_failure))
            .await
            .expect("run should finish at end of output");
        assert!(result.is_ok(), "run failed: {:?}", result.err());
        assert!(!handler.is_running());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let scan = handler.snapshot();
        assert_eq!(scan.len(), 3);
        let first = scan.get(0).unwrap();
        assert!(first.is_rotation_marker());
        assert_eq!(first.distance(), 1000.0);
        assert_eq!(scan.get(90).map(|m| m.distance()), Some(500.0));
        assert!(scan.get(180).is_none());
        assert_eq!(scan.get(270).map(|m| m.quality()), Some(0));

        let metrics = handler.metrics();
        assert_eq!(metrics.lines_read, 11);
        assert_eq!(metrics.startup_lines_skipped, 6);
        assert_eq!(metrics.measurements_stored, 3);
        assert_eq!(metrics.parse_errors, 1);
        assert_eq!(metrics.out_of_range, 1);
        assert_eq!(metrics.rotations, 1);
        assert_eq!(metrics.diagnostic_lines, 1);

        // Zero-quality slot is ignored by wider windows but not by width 1
        assert_eq!(handler.average_at(270, 1), Ok(0.0));
        assert!(handler.average_at(270, 3).unwrap().is_nan());
        assert_eq!(handler.average_for_direction(5, CardinalDirection::East), Ok(500.0));
    }

    #[tokio::test]
    async fn test_tool_receives_port_and_baud_rate() {
        let tool = FakeTool::new(r#"echo "$@" > "$(dirname "$0")/args""#);
        let mut config = tool.config();
        config.port = "/dev/ttyACM3".to_string();
        config.baud_rate = 115_200;
        let handler = RplidarHandler::new(config).unwrap();

        tokio::time::timeout(TEST_TIMEOUT, handler.run(CancelToken::new(), noop()))
            .await
            .unwrap()
            .unwrap();

        let args = std::fs::read_to_string(tool.dir.path().join("args")).unwrap();
        assert_eq!(args.trim(), "--channel --serial /dev/ttyACM3 115200");
    }

    #[tokio::test]
    async fn test_mounting_is_applied() {
        let tool = FakeTool::new(r#"echo "90 100 10""#);
        let mut config = tool.config();
        config.startup_lines = 0;
        config.upside_down = true;
        config.angle_adjustment = 10.0;
        let handler = RplidarHandler::new(config).unwrap();

        tokio::time::timeout(TEST_TIMEOUT, handler.run(CancelToken::new(), noop()))
            .await
            .unwrap()
            .unwrap();

        let scan = handler.snapshot();
        assert!(scan.get(90).is_none());
        assert_eq!(scan.get(280).map(|m| m.distance()), Some(100.0));
    }

    #[tokio::test]
    async fn test_cancel_stops_tool_and_run() {
        let tool = FakeTool::new(ENDLESS);
        let handler = Arc::new(RplidarHandler::new(tool.config()).unwrap());
        let cancel = CancelToken::new();
        let (on_failure, calls) = counting();

        let run = {
            let handler = Arc::clone(&handler);
            let cancel = cancel.clone();
            tokio::spawn(async move { handler.run(cancel, on_failure).await })
        };

        wait_until(|| handler.snapshot().len() >= 3).await;
        assert!(handler.is_running());

        cancel.cancel();
        let result = tokio::time::timeout(TEST_TIMEOUT, run).await.unwrap().unwrap();
        assert!(matches!(result, Err(HandlerError::Cancelled)));
        assert!(!handler.is_running());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        // Data from the cancelled run stays queryable
        assert!(handler.average_at(1, 3).is_ok());
    }

    #[tokio::test]
    async fn test_tool_ignoring_interrupt_is_killed() {
        let tool = FakeTool::new(
            r#"trap '' INT
while true; do sleep 0.05; done"#,
        );
        let handler = Arc::new(RplidarHandler::new(tool.config()).unwrap());
        let cancel = CancelToken::new();

        let run = {
            let handler = Arc::clone(&handler);
            let cancel = cancel.clone();
            tokio::spawn(async move { handler.run(cancel, noop()).await })
        };

        wait_until(|| handler.is_running()).await;
        tokio::time::sleep(Duration::from_millis(100)).await;

        let started = Instant::now();
        cancel.cancel();
        let result = tokio::time::timeout(TEST_TIMEOUT, run).await.unwrap().unwrap();
        assert!(matches!(result, Err(HandlerError::Cancelled)));
        // Grace period is 500ms; the kill follows it
        assert!(started.elapsed() >= Duration::from_millis(400));
        assert!(!handler.is_running());
    }

    #[tokio::test]
    async fn test_second_run_is_rejected() {
        let tool = FakeTool::new(ENDLESS);
        let handler = Arc::new(RplidarHandler::new(tool.config()).unwrap());
        let cancel = CancelToken::new();

        let first = {
            let handler = Arc::clone(&handler);
            let cancel = cancel.clone();
            tokio::spawn(async move { handler.run(cancel, noop()).await })
        };
        wait_until(|| handler.is_running()).await;

        let second = handler.run(CancelToken::new(), noop()).await;
        assert!(matches!(second, Err(HandlerError::AlreadyRunning)));
        assert!(handler.is_running());

        cancel.cancel();
        let first = tokio::time::timeout(TEST_TIMEOUT, first).await.unwrap().unwrap();
        assert!(first.unwrap_err().is_cancelled());
    }

    #[tokio::test]
    async fn test_missing_executable() {
        let tool = FakeTool::new("exit 0");
        let mut config = tool.config();
        config.ultra_simple_path = tool.dir.path().join("does_not_exist");
        let handler = RplidarHandler::new(config).unwrap();
        let (on_failure, calls) = counting();

        let result = handler.run(CancelToken::new(), on_failure).await;
        assert!(matches!(result, Err(HandlerError::ExecutableNotFound { .. })));
        assert!(result.unwrap_err().to_string().contains("does_not_exist"));
        assert!(!handler.is_running());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_overlong_line_fails_run_and_notifies() {
        let tool = FakeTool::new(
            r#"head -c 500 /dev/zero | tr '\0' 'x'
echo
exec sleep 5"#,
        );
        let handler = RplidarHandler::new(tool.config())
            .unwrap()
            .with_scanner(ScannerConfig::new(64, 128));
        let (on_failure, calls) = counting();
        let cancel = CancelToken::new();

        let result = tokio::time::timeout(TEST_TIMEOUT, handler.run(cancel.clone(), on_failure))
            .await
            .expect("reader failure should end the run");

        assert!(matches!(
            result,
            Err(HandlerError::LineTooLong {
                stream: "STDOUT",
                limit: 128
            })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!cancel.is_cancelled());
        assert!(!handler.is_running());
    }

    #[tokio::test]
    async fn test_new_run_starts_with_empty_scan() {
        let tool = FakeTool::new(
            r#"marker="$(dirname "$0")/ran"
if [ -f "$marker" ]; then
  echo "20 100 5"
else
  touch "$marker"
  echo "10 100 5"
fi"#,
        );
        let mut config = tool.config();
        config.startup_lines = 0;
        let handler = RplidarHandler::new(config).unwrap();

        handler.run(CancelToken::new(), noop()).await.unwrap();
        assert!(handler.snapshot().get(10).is_some());

        handler.run(CancelToken::new(), noop()).await.unwrap();
        let scan = handler.snapshot();
        assert!(scan.get(10).is_none());
        assert!(scan.get(20).is_some());
    }

    /// Every snapshot taken during a run holds only whole measurements
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_snapshots_are_consistent() {
        let tool = FakeTool::new(
            r#"awk 'BEGIN { for (r = 0; r < 40; r++) for (a = 0; a < 360; a++) printf "%d.5 %d.5 %d\n", a, a * 10, (a % 63) + 1 }'"#,
        );
        let mut config = tool.config();
        config.startup_lines = 0;
        let handler = Arc::new(RplidarHandler::new(config).unwrap());

        let run = {
            let handler = Arc::clone(&handler);
            tokio::spawn(async move { handler.run(CancelToken::new(), noop()).await })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let handler = Arc::clone(&handler);
                tokio::spawn(async move {
                    let mut checked = 0usize;
                    loop {
                        let running = handler.is_running();
                        for (slot, m) in handler.snapshot().iter() {
                            assert_eq!(m.distance(), slot as f64 * 10.0 + 0.5);
                            assert_eq!(m.quality() as usize, slot % 63 + 1);
                            assert_eq!(m.angle(), slot as f64 + 0.5);
                            checked += 1;
                        }
                        if !running {
                            break checked;
                        }
                        tokio::task::yield_now().await;
                    }
                })
            })
            .collect();

        tokio::time::timeout(TEST_TIMEOUT, run)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        for reader in readers {
            tokio::time::timeout(TEST_TIMEOUT, reader).await.unwrap().unwrap();
        }

        let scan = handler.snapshot();
        assert_eq!(scan.len(), 360);
        assert_eq!(handler.metrics().measurements_stored, 40 * 360);

        let averages = handler.averages_for_all_directions(1).unwrap();
        assert_eq!(averages[&CardinalDirection::South], 1800.5);
    }
}
