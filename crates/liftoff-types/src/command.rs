//! Command kinds and raw execution output
//!
//! Uses strum derives so kinds render the same way in logs, reports and
//! mission files.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// Where a queued command runs
#[derive(
    Debug, Clone, Copy, Display, EnumString, IntoStaticStr, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    /// Runs once on the operator's machine
    #[strum(serialize = "local")]
    Local,
    /// Fans out to every open session of the target
    #[strum(serialize = "remote")]
    Remote,
}

/// What a single execution produced
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub duration_ms: u64,
}

impl CommandOutput {
    /// Output of a command that exited with status 0 and printed `stdout`
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            exit_code: Some(0),
            ..Default::default()
        }
    }

    /// Output of a command that exited with `code`
    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            stderr: stderr.into(),
            exit_code: Some(code),
            ..Default::default()
        }
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0)
    }
}
