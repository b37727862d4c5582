use crate::command::{CommandKind, CommandOutput};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Host label used for executions that happen on the operator's machine
pub const LOCAL_HOST_LABEL: &str = "local";

/// Result of one fan-out call: one command on one host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostOutcome {
    /// Session label, or `local`
    pub host: String,
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
    /// Failure description when `success` is false
    pub error: Option<String>,
}

impl HostOutcome {
    /// Outcome built from whatever the executor returned
    pub fn from_output(host: impl Into<String>, output: CommandOutput) -> Self {
        let success = output.is_success();
        let error = if success {
            None
        } else {
            Some(match output.exit_code {
                Some(code) => format!("exited with status {code}"),
                None => "terminated by signal".to_string(),
            })
        };
        Self {
            host: host.into(),
            success,
            exit_code: output.exit_code,
            stdout: output.stdout,
            stderr: output.stderr,
            duration_ms: output.duration_ms,
            error,
        }
    }

    /// Outcome for an execution that never produced output
    pub fn failed(host: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            success: false,
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
            duration_ms: 0,
            error: Some(error.into()),
        }
    }
}

/// Every fan-out call made for one queued command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandReport {
    /// Position in the queue, starting at 0
    pub index: usize,
    pub kind: CommandKind,
    /// Fully composed command text
    pub command: String,
    pub outcomes: Vec<HostOutcome>,
}

impl CommandReport {
    pub fn succeeded(&self) -> bool {
        self.outcomes.iter().all(|o| o.success)
    }

    pub fn failed_hosts(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| !o.success)
            .map(|o| o.host.as_str())
            .collect()
    }
}

/// Summary of a completed run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub target: String,
    pub mission: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Number of sessions opened for the run, 0 for local runs
    pub connections: usize,
    pub commands: Vec<CommandReport>,
    /// Set when closing the sessions failed after the drain
    pub teardown_error: Option<String>,
}

impl RunReport {
    pub fn new(target: impl Into<String>, mission: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            target: target.into(),
            mission: mission.into(),
            started_at: Utc::now(),
            finished_at: None,
            connections: 0,
            commands: Vec::new(),
            teardown_error: None,
        }
    }

    /// Mark the run as finished
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// True when every fan-out call of every command succeeded
    pub fn succeeded(&self) -> bool {
        self.commands.iter().all(CommandReport::succeeded)
    }

    pub fn failed_commands(&self) -> Vec<&CommandReport> {
        self.commands.iter().filter(|c| !c.succeeded()).collect()
    }

    /// Total fan-out calls made across all commands
    pub fn execution_count(&self) -> usize {
        self.commands.iter().map(|c| c.outcomes.len()).sum()
    }

    pub fn duration_ms(&self) -> Option<i64> {
        self.finished_at
            .map(|end| (end - self.started_at).num_milliseconds())
    }
}
