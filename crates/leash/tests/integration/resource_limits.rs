use leash::{ExitReason, ResourceLimits};

use super::sh;

#[tokio::test]
async fn test_walltime_exceeded() {
    let result = sh("sleep 5")
        .walltime(0.2)
        .expect("valid walltime")
        .execute()
        .await
        .expect("Execution failed");

    assert_eq!(result.exit_reason(), ExitReason::WalltimeExceeded);
    assert!(result.walltime() >= 0.2);
    assert!(result.walltime() < 4.0);
    // Killed and reaped by the runner
    assert_eq!(result.signal(), Some(libc::SIGKILL));
    assert_eq!(result.exit_code(), None);
}

#[tokio::test]
async fn test_walltime_keeps_partial_output() {
    let result = sh("echo started; sleep 5")
        .walltime(0.5)
        .expect("valid walltime")
        .execute()
        .await
        .expect("Execution failed");

    assert_eq!(result.exit_reason(), ExitReason::WalltimeExceeded);
    assert_eq!(result.stdout_lossy(), "started\n");
}

#[tokio::test]
async fn test_walltime_not_reached() {
    let result = sh("sleep 0.1")
        .walltime(5.0)
        .expect("valid walltime")
        .execute()
        .await
        .expect("Execution failed");

    assert_eq!(result.exit_reason(), ExitReason::Normal);
    assert!(result.walltime() >= 0.1);
    assert!(result.walltime() < 5.0);
}

#[tokio::test]
async fn test_closed_pipes_then_sleep_hits_walltime_in_reaper() {
    // Output pipes close right away, so the deadline is hit while reaping
    let result = sh("exec >/dev/null 2>&1; sleep 5")
        .walltime(0.3)
        .expect("valid walltime")
        .execute()
        .await
        .expect("Execution failed");

    // The drain saw a clean close; the reaper's SIGKILL is classified as killed
    assert_eq!(result.exit_reason(), ExitReason::Killed);
    assert_eq!(result.signal(), Some(libc::SIGKILL));
    assert!(result.walltime() < 4.0);
}

#[tokio::test]
async fn test_cputime_limit_is_applied() {
    let result = sh("ulimit -t")
        .cputime(1.5)
        .expect("valid cputime")
        .execute()
        .await
        .expect("Execution failed");

    assert_eq!(result.stdout_lossy().trim(), "2");
}

#[tokio::test]
async fn test_cputime_hard_limit_matches_soft() {
    let result = sh("ulimit -H -t")
        .cputime(3.0)
        .expect("valid cputime")
        .execute()
        .await
        .expect("Execution failed");

    assert_eq!(result.stdout_lossy().trim(), "3");
}

#[tokio::test]
async fn test_memory_limit_is_applied() {
    let result = sh("ulimit -v")
        .memory(512 * ResourceLimits::MB)
        .expect("valid memory")
        .execute()
        .await
        .expect("Execution failed");

    // ulimit -v reports kilobytes
    assert_eq!(result.stdout_lossy().trim(), "524288");
}

#[tokio::test]
async fn test_cputime_limit_stops_busy_loop() {
    let result = sh("while :; do :; done")
        .cputime(1.0)
        .expect("valid cputime")
        .walltime(20.0)
        .expect("valid walltime")
        .execute()
        .await
        .expect("Execution failed");

    // Hard limit reached: the kernel kills the child outright
    assert_eq!(result.exit_reason(), ExitReason::Killed);
    assert_eq!(result.signal(), Some(libc::SIGKILL));
    assert!(result.walltime() < 20.0);
}

#[tokio::test]
async fn test_unlimited_by_default() {
    let result = sh("ulimit -t; ulimit -v")
        .execute()
        .await
        .expect("Execution failed");

    assert!(result.is_success());
}
