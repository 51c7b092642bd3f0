//! Lifecycle of the external `ultra_simple` process

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use contracts::HandlerConfig;
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tracing::{debug, info, warn};

use crate::error::{HandlerError, Result};
use crate::scanner::Stream;

/// A spawned tool with both output pipes taken
pub(crate) struct ToolProcess {
    child: Child,
    path: PathBuf,
}

/// Output pipes of a spawned tool
pub(crate) struct ToolPipes {
    pub stdout: ChildStdout,
    pub stderr: ChildStderr,
}

impl ToolProcess {
    /// Start the tool with the configured port and baud rate
    pub(crate) async fn spawn(config: &HandlerConfig) -> Result<(Self, ToolPipes)> {
        let path = config.ultra_simple_path.clone();
        ensure_exists(&path).await?;

        let args = config.tool_args();
        debug!(path = %path.display(), ?args, "starting ultra_simple");

        let mut child = Command::new(&path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| HandlerError::Spawn {
                path: path.clone(),
                source,
            })?;

        // Build the process before taking pipes so a failure below still
        // reaps the child through kill_on_drop
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let process = Self { child, path };

        let pipes = ToolPipes {
            stdout: stdout.ok_or(HandlerError::MissingPipe {
                stream: Stream::Stdout.tag(),
            })?,
            stderr: stderr.ok_or(HandlerError::MissingPipe {
                stream: Stream::Stderr.tag(),
            })?,
        };

        info!(pid = process.child.id(), "ultra_simple started");
        Ok((process, pipes))
    }

    /// Interrupt the tool and wait up to `grace` for it to exit, then kill it
    pub(crate) async fn shutdown(mut self, grace: Duration) -> Result<()> {
        if let Some(status) = self.child.try_wait()? {
            debug!(%status, "ultra_simple already exited");
            return Ok(());
        }

        self.interrupt();

        match tokio::time::timeout(grace, self.child.wait()).await {
            Ok(Ok(status)) => {
                info!(%status, "ultra_simple stopped");
                Ok(())
            }
            Ok(Err(e)) => Err(HandlerError::Io(e)),
            Err(_) => {
                warn!(
                    path = %self.path.display(),
                    grace_ms = grace.as_millis() as u64,
                    "ultra_simple did not exit in time, killing"
                );
                self.child.kill().await?;
                Ok(())
            }
        }
    }

    #[cfg(unix)]
    fn interrupt(&mut self) {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        let Some(pid) = self.child.id() else {
            return;
        };
        if let Err(e) = kill(Pid::from_raw(pid as i32), Signal::SIGINT) {
            debug!(pid, error = %e, "failed to send SIGINT");
        }
    }

    #[cfg(not(unix))]
    fn interrupt(&mut self) {
        if let Err(e) = self.child.start_kill() {
            debug!(error = %e, "failed to stop ultra_simple");
        }
    }
}

async fn ensure_exists(path: &Path) -> Result<()> {
    match tokio::fs::try_exists(path).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(HandlerError::ExecutableNotFound {
            path: path.to_path_buf(),
        }),
        Err(e) => Err(HandlerError::Io(e)),
    }
}
