//! Bounded line scanning over a child process stream

use std::fmt;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tracing::{debug, info};

use crate::cancel::CancelToken;
use crate::config::ScannerConfig;
use crate::error::{HandlerError, Result};

/// Which child stream a line came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stream {
    /// Measurement lines
    Stdout,
    /// Diagnostics
    Stderr,
}

impl Stream {
    /// Log tag
    pub const fn tag(self) -> &'static str {
        match self {
            Stream::Stdout => "STDOUT",
            Stream::Stderr => "STDERR",
        }
    }
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Feed every line of `reader` to `on_line` until EOF.
///
/// Lines are trimmed of surrounding whitespace and decoded lossily. Returns
/// `Ok(())` at end of stream, `HandlerError::Cancelled` once `cancel` or
/// `abort` fires, and `HandlerError::LineTooLong` when a line exceeds
/// `limits.max_buffer_size`. A line already read is never handed to
/// `on_line` after cancellation.
pub async fn scan_lines<R, F>(
    cancel: &CancelToken,
    abort: &CancelToken,
    stream: Stream,
    reader: R,
    limits: ScannerConfig,
    mut on_line: F,
) -> Result<()>
where
    R: AsyncRead + Unpin,
    F: FnMut(&str),
{
    let mut reader = BufReader::with_capacity(limits.initial_buffer_size.max(1), reader);
    let mut buf = Vec::with_capacity(limits.initial_buffer_size);
    let limit = limits.max_buffer_size;

    loop {
        buf.clear();
        let mut limited = (&mut reader).take(limit as u64 + 1);

        let read = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!(stream = stream.tag(), "cancelled while reading lines");
                return Err(HandlerError::Cancelled);
            }
            _ = abort.cancelled() => {
                debug!(stream = stream.tag(), "aborted while reading lines");
                return Err(HandlerError::Cancelled);
            }
            read = limited.read_until(b'\n', &mut buf) => read,
        };

        let n = read.map_err(|source| HandlerError::Read {
            stream: stream.tag(),
            source,
        })?;
        if n == 0 {
            debug!(stream = stream.tag(), "end of stream");
            return Ok(());
        }
        if buf.last() != Some(&b'\n') && buf.len() > limit {
            return Err(HandlerError::LineTooLong {
                stream: stream.tag(),
                limit,
            });
        }

        if cancel.is_cancelled() || abort.is_cancelled() {
            info!(stream = stream.tag(), "cancelled while reading lines");
            return Err(HandlerError::Cancelled);
        }

        let text = String::from_utf8_lossy(&buf);
        let line = text.trim();
        debug!(stream = stream.tag(), line, "line received");
        on_line(line);
    }
}
