//! Command runner for Leash
//!
//! Drives one child through spawn, output capture, reaping and exit
//! classification, and provides a config-aware [`Runner`] front end.

use std::os::unix::process::ExitStatusExt;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, instrument};

pub use crate::runner::classify::classify;

mod classify;

use crate::{
    command::Command,
    config::{Config, ConfigError},
    process::{self, OutputBudget, ProcessError},
    types::ExecutionResult,
};

/// Upper bound on the deadline offset so `start + walltime` cannot overflow
const MAX_WALLTIME: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Errors that prevent a run from producing a result
///
/// Limits being hit are not errors; they are reported through
/// [`ExecutionResult::exit_reason`].
#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("process error: {0}")]
    Process(#[from] ProcessError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to start runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// Run `command` to completion under its limits
///
/// Everything happens on the calling task: the only suspension points are
/// the wait for pipe readiness and the wait for the child to exit, both
/// bounded by the same deadline.
#[instrument(skip(command), fields(program = command.program()))]
pub async fn execute(command: &Command) -> Result<ExecutionResult, ExecuteError> {
    let limits = command.get_limits();
    let walltime = Duration::try_from_secs_f64(command.effective_walltime())
        .unwrap_or(MAX_WALLTIME)
        .min(MAX_WALLTIME);

    let start = tokio::time::Instant::now();
    let deadline = start + walltime;

    let process::SpawnedChild {
        mut child,
        pid,
        stdout,
        stderr,
    } = process::spawn(command)?;

    let capture = process::drain(stdout, stderr, OutputBudget::from_limits(limits), deadline).await;
    let status = process::reap(&mut child, deadline).await?;
    let elapsed = start.elapsed().as_secs_f64();

    let reason = classify(capture.reason, status.signal());

    debug!(
        pid,
        drained = ?capture.reason,
        ?reason,
        exit_code = status.code(),
        signal = status.signal(),
        walltime = elapsed,
        "execution complete"
    );

    Ok(ExecutionResult::new(
        pid,
        status.into_raw(),
        status.code(),
        status.signal(),
        reason,
        capture.stdout,
        capture.stderr,
        elapsed,
    ))
}

/// Run `command` on a private current-thread runtime, blocking the caller
///
/// Must not be called from inside an async context.
pub fn execute_blocking(command: &Command) -> Result<ExecutionResult, ExecuteError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(ExecuteError::Runtime)?;
    runtime.block_on(execute(command))
}

/// High-level runner that applies a [`Config`] to every command
#[derive(Debug, Clone)]
pub struct Runner {
    config: Config,
}

impl Runner {
    /// Create a new runner with the given configuration
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Create a new runner with default configuration
    pub fn with_defaults() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Build a command seeded with the config's limits, profile and environment
    pub fn command(
        &self,
        program: impl Into<String>,
        profile: Option<&str>,
    ) -> Result<Command, ConfigError> {
        self.config.command(program, profile)
    }

    /// Run a command
    pub async fn run(&self, command: &Command) -> Result<ExecutionResult, ExecuteError> {
        execute(command).await
    }

    /// Build and run `program` with `args` under the given profile
    pub async fn run_program<I, S>(
        &self,
        program: &str,
        args: I,
        profile: Option<&str>,
    ) -> Result<ExecutionResult, ExecuteError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let command = self.command(program, profile)?.args(args);
        self.run(&command).await
    }
}
