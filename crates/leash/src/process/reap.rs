//! Deadline-bounded reaping

use std::process::ExitStatus;

use tokio::process::Child;
use tokio::time::Instant;
use tracing::debug;

use crate::process::ProcessError;

/// Wait for `child` to exit, killing it once `deadline` has passed.
///
/// An already-exited child is collected even if the deadline is in the
/// past. After the kill the wait is unbounded, which is safe because
/// SIGKILL cannot be caught; the child is always reaped before returning.
pub async fn reap(child: &mut Child, deadline: Instant) -> Result<ExitStatus, ProcessError> {
    match tokio::time::timeout_at(deadline, child.wait()).await {
        Ok(status) => status.map_err(ProcessError::WaitFailed),
        Err(_) => {
            debug!(pid = child.id(), "deadline passed, killing child");
            if let Err(e) = child.start_kill() {
                debug!(error = %e, "kill failed, child already exited");
            }
            child.wait().await.map_err(ProcessError::WaitFailed)
        }
    }
}
