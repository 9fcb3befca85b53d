//! Output capture for a running child
//!
//! Both pipes are drained on the calling task by racing their reads against
//! each other and against the deadline, so neither stream can starve the
//! other and no helper tasks are needed.

use std::io::ErrorKind;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::types::{ExitReason, ResourceLimits};

/// Largest single read from a pipe
pub const READ_BLOCK_SIZE: usize = 65535;

/// Byte caps applied while draining
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputBudget {
    /// Combined stdout + stderr cap
    pub total: Option<u64>,
    pub stdout: Option<u64>,
    pub stderr: Option<u64>,
}

impl OutputBudget {
    pub fn from_limits(limits: &ResourceLimits) -> Self {
        Self {
            total: limits.output,
            stdout: limits.stdout,
            stderr: limits.stderr,
        }
    }
}

/// Bytes captured from both streams and how draining ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// `Normal`, `OutputExceeded` or `WalltimeExceeded`
    pub reason: ExitReason,
}

struct Stream<R> {
    name: &'static str,
    reader: Option<R>,
    buf: Vec<u8>,
    scratch: Vec<u8>,
    cap: Option<u64>,
}

impl<R: AsyncRead + Unpin> Stream<R> {
    fn new(name: &'static str, reader: R, cap: Option<u64>) -> Self {
        Self {
            name,
            reader: Some(reader),
            buf: Vec::new(),
            scratch: vec![0; READ_BLOCK_SIZE],
            cap,
        }
    }

    fn is_open(&self) -> bool {
        self.reader.is_some()
    }

    fn len(&self) -> u64 {
        self.buf.len() as u64
    }

    fn is_full(&self) -> bool {
        self.cap.is_some_and(|cap| self.len() >= cap)
    }

    /// Read at most `limit` bytes into the scratch buffer
    async fn read(&mut self, limit: usize) -> std::io::Result<usize> {
        match self.reader.as_mut() {
            Some(reader) => reader.read(&mut self.scratch[..limit]).await,
            None => std::future::pending().await,
        }
    }

    fn close(&mut self) {
        if self.reader.take().is_some() {
            debug!(stream = self.name, bytes = self.buf.len(), "stream closed");
        }
    }

    fn handle(&mut self, res: std::io::Result<usize>) {
        match res {
            Ok(0) => self.close(),
            Ok(n) => {
                trace!(stream = self.name, n, "read");
                self.buf.extend_from_slice(&self.scratch[..n]);
            }
            // Spurious wakeup or signal; the stream is still open
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::Interrupted) => {}
            Err(e) => {
                debug!(stream = self.name, error = %e, "read failed, treating as closed");
                self.close();
            }
        }
    }
}

/// Drain `stdout` and `stderr` until both close, a byte cap is reached or
/// `deadline` passes, whichever happens first.
///
/// Both readers are owned by this call and dropped (closed) on every return
/// path. Bytes the child writes after a cap is hit are never read.
pub async fn drain<O, E>(stdout: O, stderr: E, budget: OutputBudget, deadline: Instant) -> Capture
where
    O: AsyncRead + Unpin,
    E: AsyncRead + Unpin,
{
    let mut out = Stream::new("stdout", stdout, budget.stdout);
    let mut err = Stream::new("stderr", stderr, budget.stderr);

    let reason = loop {
        if !out.is_open() && !err.is_open() {
            break ExitReason::Normal;
        }

        if Instant::now() >= deadline {
            debug!("deadline passed while draining output");
            break ExitReason::WalltimeExceeded;
        }

        let total_left = budget
            .total
            .map(|cap| cap.saturating_sub(out.len() + err.len()));
        let out_limit = read_size(total_left, out.cap.map(|c| c.saturating_sub(out.len())));
        let err_limit = read_size(total_left, err.cap.map(|c| c.saturating_sub(err.len())));

        tokio::select! {
            res = out.read(out_limit), if out.is_open() => out.handle(res),
            res = err.read(err_limit), if err.is_open() => err.handle(res),
            // Loop back so the deadline check above decides
            _ = tokio::time::sleep_until(deadline) => {}
        }

        let over_total = budget
            .total
            .is_some_and(|cap| out.len() + err.len() >= cap);
        if over_total || out.is_full() || err.is_full() {
            debug!(
                stdout = out.len(),
                stderr = err.len(),
                "output limit reached"
            );
            break ExitReason::OutputExceeded;
        }
    };

    out.close();
    err.close();

    Capture {
        stdout: out.buf,
        stderr: err.buf,
        reason,
    }
}

/// Size of the next read: one block, shrunk to whatever budget is left.
/// Caps are checked after every read, so a remaining budget here is never zero.
fn read_size(total_left: Option<u64>, stream_left: Option<u64>) -> usize {
    let mut size = READ_BLOCK_SIZE as u64;
    for left in [total_left, stream_left].into_iter().flatten() {
        size = size.min(left);
    }
    size.max(1) as usize
}
