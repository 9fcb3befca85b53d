//! Child process plumbing
//!
//! This module owns the three stages that touch the operating system:
//! spawning the child with rlimits applied, draining its output pipes
//! under a byte budget and a deadline, and reaping it without blocking
//! past that deadline.
//!
//! References for the underlying primitives:
//! - https://man7.org/linux/man-pages/man2/setrlimit.2.html
//! - https://man7.org/linux/man-pages/man2/waitpid.2.html

use thiserror::Error;

pub use crate::process::output::{Capture, OutputBudget, READ_BLOCK_SIZE, drain};
pub use crate::process::reap::reap;
pub use crate::process::spawn::{SpawnedChild, rlimits, spawn};

mod output;
mod reap;
mod spawn;

/// Errors that occur while driving a child process
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to spawn '{program}': {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("child process has no {0} handle")]
    MissingHandle(&'static str),

    #[error("failed to wait for child process: {0}")]
    WaitFailed(#[source] std::io::Error),
}
