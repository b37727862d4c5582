//! Collaborator traits
//!
//! The orchestrator never opens sockets or spawns processes itself. It talks to
//! a [`ConnectionProvider`] for session lifecycle, to [`Session`]s for remote
//! execution and to a [`LocalExecutor`] for everything that runs on the
//! operator's machine. Timeouts, authentication and transport concerns all
//! live behind these traits.

use anyhow::Result;
use liftoff_types::CommandOutput;
use std::sync::Arc;

/// An established session with one remote host
#[async_trait::async_trait]
pub trait Session: Send + Sync {
    /// Label used in logs and reports
    fn host(&self) -> &str;

    /// Run a shell command on the host
    async fn exec(&self, command: &str) -> Result<CommandOutput>;
}

/// Opens and closes the sessions of a target
#[async_trait::async_trait]
pub trait ConnectionProvider: Send + Sync {
    /// Per-host configuration, passed through untouched
    type Config: Clone + Send + Sync + 'static;
    type Session: Session + 'static;

    /// Open one session per config, in order.
    ///
    /// All-or-nothing: on error the implementation is responsible for closing
    /// any session it already opened.
    async fn establish_all(&self, configs: &[Self::Config]) -> Result<Vec<Self::Session>>;

    /// Close every session, even if closing one of them fails
    async fn terminate_all(&self, sessions: Vec<Self::Session>) -> Result<()>;
}

/// Runs commands on the operator's machine
#[async_trait::async_trait]
pub trait LocalExecutor: Send + Sync {
    async fn exec(&self, command: &str) -> Result<CommandOutput>;
}

/// Type alias for a shared local executor
pub type SharedLocalExecutor = Arc<dyn LocalExecutor>;
