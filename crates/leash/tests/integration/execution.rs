use std::time::Instant;

use leash::{Command, ExecuteError, ExitReason, ProcessError};

use super::sh;

#[tokio::test]
async fn test_run_true() {
    let start = Instant::now();
    let result = Command::new("true").execute().await.expect("Execution failed");
    let elapsed = start.elapsed().as_secs_f64();

    assert_eq!(result.exit_reason(), ExitReason::Normal);
    assert_eq!(result.exit_code(), Some(0));
    assert_eq!(result.signal(), None);
    assert!(result.is_success());
    assert!(result.stdout().is_empty());
    assert!(result.stderr().is_empty());
    assert!(result.pid() > 0);
    assert!(result.walltime() > 0.0);
    assert!(result.walltime() <= elapsed);
}

#[tokio::test]
async fn test_run_exit_code() {
    let result = sh("exit 7").execute().await.expect("Execution failed");

    assert_eq!(result.exit_reason(), ExitReason::Normal);
    assert_eq!(result.exit_code(), Some(7));
    assert_eq!(result.raw_status(), 7 << 8);
    assert!(!result.is_success());
}

#[tokio::test]
async fn test_captures_both_streams() {
    let result = sh("echo out; echo err >&2; echo more")
        .execute()
        .await
        .expect("Execution failed");

    assert_eq!(result.exit_reason(), ExitReason::Normal);
    assert_eq!(result.stdout(), b"out\nmore\n");
    assert_eq!(result.stderr(), b"err\n");
}

#[tokio::test]
async fn test_captures_binary_output() {
    let result = sh("printf '\\000\\377\\001'")
        .execute()
        .await
        .expect("Execution failed");

    assert_eq!(result.stdout(), &[0u8, 0xff, 0x01]);
}

#[tokio::test]
async fn test_stdin_is_null() {
    let result = Command::new("cat").execute().await.expect("Execution failed");

    assert_eq!(result.exit_reason(), ExitReason::Normal);
    assert_eq!(result.exit_code(), Some(0));
    assert!(result.stdout().is_empty());
}

#[tokio::test]
async fn test_arguments_are_passed_verbatim() {
    let result = Command::new("printf")
        .args(["%s|", "a b", "", "$HOME"])
        .execute()
        .await
        .expect("Execution failed");

    assert_eq!(result.stdout_lossy(), "a b||$HOME|");
}

#[tokio::test]
async fn test_environment_override() {
    let result = sh("printf %s \"$LEASH_TEST_VALUE\"")
        .env("LEASH_TEST_VALUE", "from-leash")
        .execute()
        .await
        .expect("Execution failed");

    assert_eq!(result.stdout_lossy(), "from-leash");
}

#[tokio::test]
async fn test_environment_is_inherited() {
    // PATH must survive an override of an unrelated variable
    let result = sh("command -v sh >/dev/null && echo found")
        .env("LEASH_OTHER", "1")
        .execute()
        .await
        .expect("Execution failed");

    assert_eq!(result.stdout_lossy(), "found\n");
}

#[tokio::test]
async fn test_spawn_failure_is_an_error() {
    let result = Command::new("/nonexistent/leash/program").execute().await;

    match result {
        Err(ExecuteError::Process(ProcessError::SpawnFailed { source, .. })) => {
            assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
        }
        other => panic!("expected spawn failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_self_sigkill_is_killed() {
    let result = sh("kill -9 $$").execute().await.expect("Execution failed");

    assert_eq!(result.exit_reason(), ExitReason::Killed);
    assert_eq!(result.signal(), Some(libc::SIGKILL));
    assert_eq!(result.exit_code(), None);
}

#[tokio::test]
async fn test_other_signal_is_normal() {
    let result = sh("kill -TERM $$").execute().await.expect("Execution failed");

    assert_eq!(result.exit_reason(), ExitReason::Normal);
    assert_eq!(result.signal(), Some(libc::SIGTERM));
    assert_eq!(result.exit_code(), None);
    assert!(!result.is_success());
}

#[test]
fn test_execute_blocking() {
    let result = sh("echo blocking")
        .execute_blocking()
        .expect("Execution failed");

    assert!(result.is_success());
    assert_eq!(result.stdout_lossy(), "blocking\n");
}

#[tokio::test]
async fn test_template_command_is_reusable() {
    let base = Command::new("sh").arg("-c");
    let first = base.arg("exit 1").execute().await.expect("Execution failed");
    let second = base.arg("exit 2").execute().await.expect("Execution failed");

    assert_eq!(first.exit_code(), Some(1));
    assert_eq!(second.exit_code(), Some(2));
    assert_eq!(base.get_args(), ["-c"]);
}
