//! Queued commands
//!
//! A command's text is composed from the scope stack when it is queued and
//! never changes afterwards.

use crate::connection::{LocalExecutor, Session};
use crate::error::OrchestratorError;
use liftoff_types::{CommandKind, HostOutcome, LOCAL_HOST_LABEL};
use std::time::Instant;

/// A composed command waiting in the queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedCommand {
    kind: CommandKind,
    text: String,
}

impl QueuedCommand {
    pub fn new(kind: CommandKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn remote(text: impl Into<String>) -> Self {
        Self::new(CommandKind::Remote, text)
    }

    pub fn local(text: impl Into<String>) -> Self {
        Self::new(CommandKind::Local, text)
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Execute once.
    ///
    /// Remote commands run on `session` when one is given and on the local
    /// executor otherwise; local commands always ignore the session. The
    /// duration is the one the executor reported, or the measured wall time
    /// when execution failed outright.
    pub async fn execute<S>(&self, session: Option<&S>, local: &dyn LocalExecutor) -> HostOutcome
    where
        S: Session + ?Sized,
    {
        let started = Instant::now();
        let (host, result) = match (self.kind, session) {
            (CommandKind::Remote, Some(session)) => {
                (session.host().to_string(), session.exec(&self.text).await)
            }
            _ => (LOCAL_HOST_LABEL.to_string(), local.exec(&self.text).await),
        };

        match result {
            Ok(output) => HostOutcome::from_output(host, output),
            // No output to take a duration from
            Err(e) => {
                let mut outcome = HostOutcome::failed(host, format!("{e:#}"));
                outcome.duration_ms = started.elapsed().as_millis() as u64;
                outcome
            }
        }
    }

    /// The error describing a failed outcome of this command
    pub fn failure(&self, outcome: &HostOutcome) -> Option<OrchestratorError> {
        if outcome.success {
            return None;
        }
        Some(OrchestratorError::CommandExecutionFailed {
            command: self.text.clone(),
            host: outcome.host.clone(),
            reason: outcome
                .error
                .clone()
                .unwrap_or_else(|| "unknown failure".to_string()),
        })
    }
}
