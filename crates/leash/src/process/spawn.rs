//! Child process creation with rlimits

use std::process::Stdio;

use tokio::process::{Child, ChildStderr, ChildStdout};
use tracing::{debug, instrument};

use crate::command::Command;
use crate::process::ProcessError;

/// A freshly spawned child and the parent's ends of its output pipes
#[derive(Debug)]
pub struct SpawnedChild {
    pub child: Child,
    pub pid: u32,
    pub stdout: ChildStdout,
    pub stderr: ChildStderr,
}

/// Resource limits to install in the child before exec, as
/// `(resource, limit)` pairs. Only configured limits are listed.
pub fn rlimits(command: &Command) -> Vec<(libc::c_int, libc::rlim_t)> {
    let limits = command.get_limits();
    let mut out = Vec::with_capacity(2);

    if let Some(seconds) = limits.cputime {
        // RLIMIT_CPU has whole-second granularity; never round a positive limit down to zero
        let secs = seconds.ceil().max(1.0) as libc::rlim_t;
        out.push((libc::RLIMIT_CPU as libc::c_int, secs));
    }
    if let Some(bytes) = limits.memory {
        out.push((libc::RLIMIT_AS as libc::c_int, bytes as libc::rlim_t));
    }

    out
}

/// Spawn the child described by `command`
///
/// stdin is bound to /dev/null, stdout and stderr to fresh pipes. The
/// parent's copies of the pipe write ends are closed by the time this
/// returns, so the read ends see EOF once the child (and anything it
/// forked) closes them.
#[instrument(skip(command), fields(program = command.program()))]
pub fn spawn(command: &Command) -> Result<SpawnedChild, ProcessError> {
    let limits = rlimits(command);
    debug!(?limits, args = ?command.get_args(), "spawning child");

    let mut cmd = tokio::process::Command::new(command.program());
    cmd.args(command.get_args())
        .envs(command.get_envs())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    if !limits.is_empty() {
        // SAFETY: the closure runs between fork and exec and only issues
        // getrlimit/setrlimit syscalls on a pre-built slice, no allocation.
        unsafe {
            cmd.pre_exec(move || apply_rlimits(&limits));
        }
    }

    let mut child = cmd.spawn().map_err(|source| ProcessError::SpawnFailed {
        program: command.program().to_string(),
        source,
    })?;

    // Only None after the child has been reaped, which cannot have happened yet
    let pid = child.id().ok_or(ProcessError::MissingHandle("pid"))?;
    let stdout = child.stdout.take().ok_or(ProcessError::MissingHandle("stdout"))?;
    let stderr = child.stderr.take().ok_or(ProcessError::MissingHandle("stderr"))?;

    debug!(pid, "child spawned");

    Ok(SpawnedChild {
        child,
        pid,
        stdout,
        stderr,
    })
}

/// Set both soft and hard limit of each resource, clamped to the current hard
/// limit. With the two equal, RLIMIT_CPU delivers SIGKILL instead of SIGXCPU.
fn apply_rlimits(limits: &[(libc::c_int, libc::rlim_t)]) -> std::io::Result<()> {
    for &(resource, value) in limits {
        let mut rlim = libc::rlimit {
            rlim_cur: 0,
            rlim_max: 0,
        };
        // SAFETY: rlim is a valid out pointer, resource is a valid constant.
        if unsafe { libc::getrlimit(resource as _, &mut rlim) } != 0 {
            return Err(std::io::Error::last_os_error());
        }
        let value = if rlim.rlim_max == libc::RLIM_INFINITY {
            value
        } else {
            value.min(rlim.rlim_max)
        };
        rlim.rlim_cur = value;
        rlim.rlim_max = value;
        // SAFETY: rlim is valid, resource is a valid constant.
        if unsafe { libc::setrlimit(resource as _, &rlim) } != 0 {
            return Err(std::io::Error::last_os_error());
        }
    }
    Ok(())
}
