//! LocalShell runs real `sh` processes; only shell builtins are used.

use liftoff_orchestrator::LocalExecutor;
use liftoff_runner::{LocalShell, ProcessError, RunnerConfig};
use std::time::Duration;

#[tokio::test]
async fn test_captures_stdout_and_exit_code() {
    let shell = LocalShell::default();
    let output = shell.exec("echo hello; echo world").await.unwrap();

    assert!(output.is_success());
    assert_eq!(output.exit_code, Some(0));
    assert_eq!(output.stdout, "hello\nworld\n");
    assert!(output.stderr.is_empty());
}

#[tokio::test]
async fn test_non_zero_exit_is_returned_not_raised() {
    let shell = LocalShell::default();
    let output = shell.exec("echo broken >&2; exit 3").await.unwrap();

    assert!(!output.is_success());
    assert_eq!(output.exit_code, Some(3));
    assert_eq!(output.stderr, "broken\n");
}

#[tokio::test]
async fn test_composed_commands_run_in_one_shell() {
    let shell = LocalShell::default();
    let output = shell.exec("cd / && pwd").await.unwrap();
    assert_eq!(output.stdout.trim(), "/");
}

#[tokio::test]
async fn test_timeout_kills_the_command() {
    let shell = LocalShell::default().with_timeout(Duration::from_millis(200));
    let err = shell.exec("sleep 5").await.unwrap_err();

    let process_error = err.downcast_ref::<ProcessError>().unwrap();
    assert!(matches!(process_error, ProcessError::Timeout { timeout_ms: 200, .. }));
}

#[tokio::test]
async fn test_missing_shell_is_a_spawn_error() {
    let shell = LocalShell::new("/nonexistent/liftoff-shell");
    let err = shell.exec("true").await.unwrap_err();

    let process_error = err.downcast_ref::<ProcessError>().unwrap();
    assert!(matches!(process_error, ProcessError::SpawnError { .. }));
}

#[tokio::test]
async fn test_from_config_uses_shell_and_timeout() {
    let config = RunnerConfig::default().with_command_timeout(Duration::from_millis(100));
    let shell = LocalShell::from_config(&config);

    assert!(shell.exec("sleep 2").await.is_err());
    assert!(shell.exec("true").await.unwrap().is_success());
}
