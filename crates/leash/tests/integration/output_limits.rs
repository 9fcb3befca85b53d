use leash::{ExitReason, process::READ_BLOCK_SIZE};

use super::sh;

#[tokio::test]
async fn test_output_exceeded() {
    let result = sh("head -c 10000000 /dev/zero")
        .output(1024)
        .expect("valid output limit")
        .execute()
        .await
        .expect("Execution failed");

    assert_eq!(result.exit_reason(), ExitReason::OutputExceeded);
    assert!(result.stdout().len() >= 1024);
    assert!(result.stdout().len() <= 1024 + READ_BLOCK_SIZE);
}

#[tokio::test]
async fn test_output_limit_counts_stderr() {
    let result = sh("head -c 100000 /dev/zero >&2")
        .output(2000)
        .expect("valid output limit")
        .execute()
        .await
        .expect("Execution failed");

    assert_eq!(result.exit_reason(), ExitReason::OutputExceeded);
    assert!(result.stdout().len() + result.stderr().len() >= 2000);
    assert!(result.stdout().len() + result.stderr().len() <= 2000 + READ_BLOCK_SIZE);
}

#[tokio::test]
async fn test_output_under_limit_is_normal() {
    let result = sh("echo small")
        .output(1024)
        .expect("valid output limit")
        .execute()
        .await
        .expect("Execution failed");

    assert_eq!(result.exit_reason(), ExitReason::Normal);
    assert_eq!(result.stdout_lossy(), "small\n");
}

#[tokio::test]
async fn test_stdout_limit() {
    let result = sh("echo fine >&2; head -c 100000 /dev/zero")
        .stdout_limit(500)
        .expect("valid stdout limit")
        .execute()
        .await
        .expect("Execution failed");

    assert_eq!(result.exit_reason(), ExitReason::OutputExceeded);
    assert_eq!(result.stdout().len(), 500);
}

#[tokio::test]
async fn test_stderr_limit() {
    let result = sh("head -c 100000 /dev/zero >&2")
        .stderr_limit(300)
        .expect("valid stderr limit")
        .execute()
        .await
        .expect("Execution failed");

    assert_eq!(result.exit_reason(), ExitReason::OutputExceeded);
    assert_eq!(result.stderr().len(), 300);
}

#[tokio::test]
async fn test_large_output_without_limit() {
    let result = sh("head -c 1000000 /dev/zero")
        .execute()
        .await
        .expect("Execution failed");

    assert_eq!(result.exit_reason(), ExitReason::Normal);
    assert_eq!(result.stdout().len(), 1_000_000);
}
