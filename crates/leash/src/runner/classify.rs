//! Exit classification

use crate::types::ExitReason;

/// Combine the output stage's verdict with the child's terminating signal.
///
/// A clean drain followed by death from SIGKILL means something killed the
/// child behind our back (usually the kernel enforcing an rlimit), so it is
/// reported as `Killed`. Other signals, and limits already reported by the
/// output stage, pass through unchanged.
pub fn classify(drained: ExitReason, signal: Option<i32>) -> ExitReason {
    match (drained, signal) {
        (ExitReason::Normal, Some(libc::SIGKILL)) => ExitReason::Killed,
        (reason, _) => reason,
    }
}
