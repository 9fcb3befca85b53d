//! Immutable command description
//!
//! A [`Command`] names the program to run, its arguments, environment
//! overrides and resource limits. Every builder method borrows the receiver
//! and returns a fresh value, so a command can be used as a template and
//! specialised without affecting earlier copies.

use std::collections::HashMap;

use crate::config::ConfigError;
use crate::runner::{self, ExecuteError};
use crate::types::{DEFAULT_WALLTIME, ExecutionResult, ResourceLimits, check_bytes, check_seconds};

#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    program: String,
    args: Vec<String>,
    /// Merged over the inherited environment
    env: HashMap<String, String>,
    limits: ResourceLimits,
}

impl Command {
    /// Create a command for `program` with no arguments and no limits
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: HashMap::new(),
            limits: ResourceLimits::default(),
        }
    }

    /// Set the program to run
    pub fn program_name(&self, program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..self.clone()
        }
    }

    /// Append one argument
    pub fn arg(&self, arg: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.args.push(arg.into());
        next
    }

    /// Append several arguments
    pub fn args<I, S>(&self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut next = self.clone();
        next.args.extend(args.into_iter().map(Into::into));
        next
    }

    /// Replace the argument list
    pub fn replace_args<I, S>(&self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            ..self.clone()
        }
    }

    /// Add an environment override
    pub fn env(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.env.insert(key.into(), value.into());
        next
    }

    /// Replace all environment overrides
    pub fn envs(&self, env: HashMap<String, String>) -> Self {
        Self {
            env,
            ..self.clone()
        }
    }

    /// Set the address space limit in bytes
    pub fn memory(&self, bytes: u64) -> Result<Self, ConfigError> {
        check_bytes("memory", Some(bytes))?;
        Ok(self.with_limits(ResourceLimits::new().with_memory(bytes)))
    }

    /// Set the CPU time limit in seconds
    pub fn cputime(&self, seconds: f64) -> Result<Self, ConfigError> {
        check_seconds("cputime", Some(seconds))?;
        Ok(self.with_limits(ResourceLimits::new().with_cputime(seconds)))
    }

    /// Set the wall clock limit in seconds
    pub fn walltime(&self, seconds: f64) -> Result<Self, ConfigError> {
        check_seconds("walltime", Some(seconds))?;
        Ok(self.with_limits(ResourceLimits::new().with_walltime(seconds)))
    }

    /// Set the combined stdout + stderr limit in bytes
    pub fn output(&self, bytes: u64) -> Result<Self, ConfigError> {
        check_bytes("output", Some(bytes))?;
        Ok(self.with_limits(ResourceLimits::new().with_output(bytes)))
    }

    /// Set the captured stdout limit in bytes
    pub fn stdout_limit(&self, bytes: u64) -> Result<Self, ConfigError> {
        check_bytes("stdout", Some(bytes))?;
        Ok(self.with_limits(ResourceLimits::new().with_stdout(bytes)))
    }

    /// Set the captured stderr limit in bytes
    pub fn stderr_limit(&self, bytes: u64) -> Result<Self, ConfigError> {
        check_bytes("stderr", Some(bytes))?;
        Ok(self.with_limits(ResourceLimits::new().with_stderr(bytes)))
    }

    /// Overlay every limit present in `limits`
    pub fn limits(&self, limits: &ResourceLimits) -> Result<Self, ConfigError> {
        limits.validate()?;
        Ok(self.with_limits(limits.clone()))
    }

    fn with_limits(&self, overrides: ResourceLimits) -> Self {
        Self {
            limits: self.limits.with_overrides(&overrides),
            ..self.clone()
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    pub fn get_envs(&self) -> &HashMap<String, String> {
        &self.env
    }

    pub fn get_limits(&self) -> &ResourceLimits {
        &self.limits
    }

    /// Configured wall clock limit, or the one hour default
    pub fn effective_walltime(&self) -> f64 {
        self.limits.walltime.unwrap_or(DEFAULT_WALLTIME)
    }

    /// Run the command to completion
    pub async fn execute(&self) -> Result<ExecutionResult, ExecuteError> {
        runner::execute(self).await
    }

    /// Run the command to completion on a private single-threaded runtime
    pub fn execute_blocking(&self) -> Result<ExecutionResult, ExecuteError> {
        runner::execute_blocking(self)
    }
}
