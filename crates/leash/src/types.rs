use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Wall clock limit applied when none is configured, in seconds
pub const DEFAULT_WALLTIME: f64 = 3600.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Address space limit in bytes (RLIMIT_AS)
    #[serde(default)]
    pub memory: Option<u64>,

    /// CPU time limit in seconds (RLIMIT_CPU)
    #[serde(default)]
    pub cputime: Option<f64>,

    /// Wall clock time limit in seconds
    #[serde(default)]
    pub walltime: Option<f64>,

    /// Combined stdout + stderr limit in bytes
    #[serde(default)]
    pub output: Option<u64>,

    /// Captured stdout limit in bytes
    #[serde(default)]
    pub stdout: Option<u64>,

    /// Captured stderr limit in bytes
    #[serde(default)]
    pub stderr: Option<u64>,
}

impl ResourceLimits {
    /// 1 kilobyte in bytes
    pub const KB: u64 = 1024;
    /// 1 megabyte in bytes
    pub const MB: u64 = 1024 * 1024;
    /// 1 gigabyte in bytes
    pub const GB: u64 = 1024 * 1024 * 1024;

    /// Create new resource limits with all fields set to None
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the address space limit in bytes
    pub fn with_memory(mut self, bytes: u64) -> Self {
        self.memory = Some(bytes);
        self
    }

    /// Set the CPU time limit in seconds
    pub fn with_cputime(mut self, seconds: f64) -> Self {
        self.cputime = Some(seconds);
        self
    }

    /// Set the wall clock time limit in seconds
    pub fn with_walltime(mut self, seconds: f64) -> Self {
        self.walltime = Some(seconds);
        self
    }

    /// Set the combined output limit in bytes
    pub fn with_output(mut self, bytes: u64) -> Self {
        self.output = Some(bytes);
        self
    }

    /// Set the stdout limit in bytes
    pub fn with_stdout(mut self, bytes: u64) -> Self {
        self.stdout = Some(bytes);
        self
    }

    /// Set the stderr limit in bytes
    pub fn with_stderr(mut self, bytes: u64) -> Self {
        self.stderr = Some(bytes);
        self
    }

    /// Apply overrides from another ResourceLimits, preferring values from `overrides`
    ///
    /// Returns a new ResourceLimits with values from `overrides` taking precedence
    /// over values from `self` when both are present.
    pub fn with_overrides(&self, overrides: &ResourceLimits) -> ResourceLimits {
        ResourceLimits {
            memory: overrides.memory.or(self.memory),
            cputime: overrides.cputime.or(self.cputime),
            walltime: overrides.walltime.or(self.walltime),
            output: overrides.output.or(self.output),
            stdout: overrides.stdout.or(self.stdout),
            stderr: overrides.stderr.or(self.stderr),
        }
    }

    /// Check that every present limit is a positive, finite number
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_bytes("memory", self.memory)?;
        check_seconds("cputime", self.cputime)?;
        check_seconds("walltime", self.walltime)?;
        check_bytes("output", self.output)?;
        check_bytes("stdout", self.stdout)?;
        check_bytes("stderr", self.stderr)?;
        Ok(())
    }
}

pub(crate) fn check_bytes(name: &'static str, value: Option<u64>) -> Result<(), ConfigError> {
    match value {
        Some(0) => Err(ConfigError::InvalidLimit {
            name,
            value: "0".to_string(),
        }),
        _ => Ok(()),
    }
}

pub(crate) fn check_seconds(name: &'static str, value: Option<f64>) -> Result<(), ConfigError> {
    match value {
        Some(v) if !(v.is_finite() && v > 0.0) => Err(ConfigError::InvalidLimit {
            name,
            value: v.to_string(),
        }),
        _ => Ok(()),
    }
}

/// Why a run ended. Exactly one is assigned per execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    /// Both output streams closed before any limit was hit
    Normal,

    /// The combined or a per-stream output limit was reached
    OutputExceeded,

    /// The wall clock deadline passed
    WalltimeExceeded,

    /// Streams closed cleanly but the process died from SIGKILL
    Killed,
}

impl ExitReason {
    /// Check whether a limit ended the run
    #[must_use]
    pub fn is_limit(&self) -> bool {
        !matches!(self, ExitReason::Normal)
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExitReason::Normal => "normal",
            ExitReason::OutputExceeded => "output exceeded",
            ExitReason::WalltimeExceeded => "walltime exceeded",
            ExitReason::Killed => "killed",
        };
        f.write_str(s)
    }
}

/// Result of an execution
///
/// Built once after the child has been reaped and never modified afterwards.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pid: u32,
    raw_status: i32,
    exit_code: Option<i32>,
    signal: Option<i32>,
    exit_reason: ExitReason,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    walltime: f64,
}

impl ExecutionResult {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        pid: u32,
        raw_status: i32,
        exit_code: Option<i32>,
        signal: Option<i32>,
        exit_reason: ExitReason,
        stdout: Vec<u8>,
        stderr: Vec<u8>,
        walltime: f64,
    ) -> Self {
        Self {
            pid,
            raw_status,
            exit_code,
            signal,
            exit_reason,
            stdout,
            stderr,
            walltime,
        }
    }

    /// Process ID of the child
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Raw wait status as returned by waitpid(2)
    pub fn raw_status(&self) -> i32 {
        self.raw_status
    }

    /// Exit code if the program exited normally
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// Signal number if the program was terminated by a signal
    pub fn signal(&self) -> Option<i32> {
        self.signal
    }

    pub fn exit_reason(&self) -> ExitReason {
        self.exit_reason
    }

    /// Captured standard output, possibly truncated
    pub fn stdout(&self) -> &[u8] {
        &self.stdout
    }

    /// Captured standard error, possibly truncated
    pub fn stderr(&self) -> &[u8] {
        &self.stderr
    }

    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    /// Elapsed wall clock time in seconds, from spawn until the child was reaped
    pub fn walltime(&self) -> f64 {
        self.walltime
    }

    /// Check if the execution was successful (exited with code 0, no limit hit)
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.exit_reason, ExitReason::Normal) && self.exit_code == Some(0)
    }
}
