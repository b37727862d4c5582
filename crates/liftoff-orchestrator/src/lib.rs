//! # liftoff-orchestrator
//!
//! Mission orchestration engine for liftoff.
//!
//! Missions are named bodies that queue shell commands; targets are named
//! groups of hosts. Running a mission against a target opens one session per
//! host, lets the mission queue its commands, then executes the queue in order
//! with each remote command fanned out to every session in parallel.

pub mod command;
pub mod connection;
pub mod context;
pub mod error;
pub mod orchestrator;
pub mod registry;
pub mod scope;

pub use command::QueuedCommand;
pub use connection::{ConnectionProvider, LocalExecutor, Session, SharedLocalExecutor};
pub use context::{MissionContext, ScopeGuard};
pub use error::{OrchestratorError, Result};
pub use orchestrator::{Orchestrator, RunPhase, DEFAULT_MISSION, LOCAL_TARGET};
pub use registry::{mission_fn, Mission, Registry, SharedMission};
pub use scope::{ScopeStack, CONJUNCTION};

/// Re-export common types for convenience
pub use liftoff_types::{CommandKind, CommandOutput, CommandReport, HostOutcome, RunReport};
