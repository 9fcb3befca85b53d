//! A library for running external commands under hard resource limits.
//!
//! Leash spawns a child process, captures its output and returns a single
//! immutable [`ExecutionResult`] describing how the run ended. The child can
//! never run forever, grow without bound or flood the caller with output.
//!
//! # Features
//!
//! - **Resource limits**: CPU time and address space via rlimits, applied before exec.
//! - **Wall clock deadline**: A single deadline bounds both output capture and reaping.
//! - **Output caps**: Combined and per-stream byte limits on captured stdout/stderr.
//! - **Exit classification**: Normal exit, output exceeded, walltime exceeded or killed.
//! - **Immutable commands**: Builder calls return new values and never modify the receiver.
//! - **TOML configuration**: Default limits, environment and named limit profiles.
//!
//! ```no_run
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use leash::{Command, ExitReason};
//!
//! let result = Command::new("sleep")
//!     .arg("5")
//!     .walltime(0.2)?
//!     .execute()
//!     .await?;
//! assert_eq!(result.exit_reason(), ExitReason::WalltimeExceeded);
//! # Ok(())
//! # }
//! ```

pub use command::Command;
pub use config::{Config, ConfigError, EXAMPLE_CONFIG};
pub use process::ProcessError;
pub use runner::{ExecuteError, Runner, execute, execute_blocking};
pub use types::{DEFAULT_WALLTIME, ExecutionResult, ExitReason, ResourceLimits};

pub mod command;
pub mod config;
pub mod process;
pub mod runner;
pub mod types;
