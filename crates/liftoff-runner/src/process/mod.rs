//! Process backends
//!
//! Everything that spawns an operating-system process lives here: the local
//! shell used for local commands and the ssh client used for sessions.

pub mod local;
pub mod ssh;

pub use local::LocalShell;
pub use ssh::{SshConnectionProvider, SshSession};

use liftoff_types::CommandOutput;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Error types for process execution
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("Failed to start '{program}': {source}")]
    SpawnError {
        program: String,
        source: std::io::Error,
    },

    #[error("'{program}' timed out after {timeout_ms}ms")]
    Timeout { program: String, timeout_ms: u64 },

    #[error("ssh to {host} failed: {message}")]
    SshError { host: String, message: String },
}

/// Run `command` to completion and capture its output.
///
/// The child is killed when `limit` elapses.
pub(crate) async fn run_captured(
    mut command: Command,
    limit: Option<Duration>,
) -> Result<CommandOutput, ProcessError> {
    let program = command.as_std().get_program().to_string_lossy().to_string();
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let started = Instant::now();
    let child = command.spawn().map_err(|source| ProcessError::SpawnError {
        program: program.clone(),
        source,
    })?;
    debug!(program = %program, pid = ?child.id(), "Spawned process");

    let output = match limit {
        Some(limit) => match timeout(limit, child.wait_with_output()).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    program = %program,
                    timeout_ms = limit.as_millis() as u64,
                    "Process timed out, killing it"
                );
                return Err(ProcessError::Timeout {
                    program,
                    timeout_ms: limit.as_millis() as u64,
                });
            }
        },
        None => child.wait_with_output().await,
    }
    .map_err(|source| ProcessError::SpawnError {
        program: program.clone(),
        source,
    })?;

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        exit_code: output.status.code(),
        duration_ms: started.elapsed().as_millis() as u64,
    })
}
