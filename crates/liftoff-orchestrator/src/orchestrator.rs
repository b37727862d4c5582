//! Run lifecycle
//!
//! One call to [`Orchestrator::run`] walks through
//! `Validating -> (Connecting ->) MissionRunning -> Draining -> (Disconnecting ->) Done`.
//! Validation and connection errors end the run; command failures are
//! recorded in the report and the drain moves on.

use crate::command::QueuedCommand;
use crate::connection::{ConnectionProvider, LocalExecutor, SharedLocalExecutor};
use crate::context::MissionContext;
use crate::error::{OrchestratorError, Result};
use crate::registry::{Mission, Registry};
use futures::future::join_all;
use liftoff_types::{CommandKind, CommandReport, HostOutcome, RunReport};
use std::sync::Arc;
use strum::Display;
use tracing::{debug, error, info, instrument, warn, Span};

/// Pseudo-target that is always valid and never opens connections
pub const LOCAL_TARGET: &str = "local";

/// Mission run when none is named
pub const DEFAULT_MISSION: &str = "default";

/// Phases of a single run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum RunPhase {
    Validating,
    Connecting,
    MissionRunning,
    Draining,
    Disconnecting,
    Done,
    Failed,
}

/// Registers missions and targets and runs one against the other
pub struct Orchestrator<P: ConnectionProvider> {
    provider: Arc<P>,
    local: SharedLocalExecutor,
    registry: Registry<P::Config>,
}

impl<P: ConnectionProvider> Orchestrator<P> {
    pub fn new(provider: P, local: impl LocalExecutor + 'static) -> Self {
        Self::with_shared(Arc::new(provider), Arc::new(local))
    }

    /// Build from collaborators that are shared with other owners
    pub fn with_shared(provider: Arc<P>, local: SharedLocalExecutor) -> Self {
        Self {
            provider,
            local,
            registry: Registry::new(),
        }
    }

    /// Add or replace a target
    pub fn register_target(&mut self, name: impl Into<String>, configs: Vec<P::Config>) -> Result<()> {
        self.registry.register_target(name, configs)
    }

    /// Add or replace a mission. The body does not run until [`Self::run`].
    pub fn register_mission<M>(&mut self, name: impl Into<String>, mission: M) -> Result<()>
    where
        M: Mission + 'static,
    {
        self.registry.register_mission(name, Arc::new(mission))
    }

    /// Forget all missions and targets.
    ///
    /// Queues and scopes live in the per-run context and are always empty
    /// between runs.
    pub fn reset(&mut self) {
        self.registry.clear();
        info!("Orchestrator reset");
    }

    pub fn registry(&self) -> &Registry<P::Config> {
        &self.registry
    }

    /// Run the `default` mission against `target`
    pub async fn run_default(&self, target: &str) -> Result<RunReport> {
        self.run(target, DEFAULT_MISSION).await
    }

    /// Run `mission` against every host of `target`.
    ///
    /// Returns `Ok` once the queue has been drained, however many individual
    /// commands failed.
    #[instrument(skip(self), fields(run_id = tracing::field::Empty))]
    pub async fn run(&self, target: &str, mission: &str) -> Result<RunReport> {
        log_phase(RunPhase::Validating);
        let body = match self.registry.mission(mission) {
            Some(body) => body,
            None => {
                log_phase(RunPhase::Failed);
                return Err(OrchestratorError::MissionNotFound {
                    mission: mission.to_string(),
                });
            }
        };
        let configs = match self.registry.target(target) {
            Some(configs) => configs.to_vec(),
            None if target == LOCAL_TARGET => Vec::new(),
            None => {
                log_phase(RunPhase::Failed);
                return Err(OrchestratorError::TargetNotFound {
                    target: target.to_string(),
                });
            }
        };

        let mut report = RunReport::new(target, mission);
        Span::current().record("run_id", tracing::field::display(report.run_id));
        info!(hosts = configs.len(), "Starting run");

        let connected = !configs.is_empty();
        let sessions = if connected {
            log_phase(RunPhase::Connecting);
            self.provider
                .establish_all(&configs)
                .await
                .map_err(|source| OrchestratorError::ConnectionEstablishmentFailed {
                    target: target.to_string(),
                    source,
                })?
        } else {
            Vec::new()
        };
        report.connections = sessions.len();
        if connected {
            info!(connections = sessions.len(), "Connections established");
        }

        log_phase(RunPhase::MissionRunning);
        let mut ctx = MissionContext::new(target);
        if let Err(source) = body.run(&mut ctx).await {
            error!(error = %source, "Mission body failed, skipping drain");
            if connected {
                log_phase(RunPhase::Disconnecting);
                if let Err(e) = self.disconnect(target, sessions).await {
                    error!(error = %e, "Failed to disconnect after mission failure");
                }
            }
            return Err(OrchestratorError::MissionFailed {
                mission: mission.to_string(),
                source,
            });
        }
        if ctx.scope_depth() != 0 {
            warn!(depth = ctx.scope_depth(), "Mission finished with scopes still entered");
        }
        let queue = ctx.into_queue();

        log_phase(RunPhase::Draining);
        report.commands = self.drain(&queue, &sessions).await;

        if connected {
            log_phase(RunPhase::Disconnecting);
            if let Err(e) = self.disconnect(target, sessions).await {
                error!(error = %e, "Failed to disconnect");
                report.teardown_error = Some(e.to_string());
            }
        }

        report.finish();
        log_phase(RunPhase::Done);
        info!(
            commands = report.commands.len(),
            executions = report.execution_count(),
            failed = report.failed_commands().len(),
            "Run finished"
        );
        Ok(report)
    }

    /// Execute the queue in order, one command at a time
    async fn drain(&self, queue: &[QueuedCommand], sessions: &[P::Session]) -> Vec<CommandReport> {
        let mut reports = Vec::with_capacity(queue.len());

        for (index, command) in queue.iter().enumerate() {
            info!(
                "Executing command {}/{}: {}",
                index + 1,
                queue.len(),
                command.text()
            );

            let outcomes = self.fan_out(command, sessions).await;
            for outcome in &outcomes {
                if let Some(failure) = command.failure(outcome) {
                    error!(
                        command = %command.text(),
                        host = %outcome.host,
                        stderr = %outcome.stderr.trim_end(),
                        "{failure}"
                    );
                }
            }

            reports.push(CommandReport {
                index,
                kind: command.kind(),
                command: command.text().to_string(),
                outcomes,
            });
        }

        reports
    }

    /// One execution per open session for remote commands, a single one otherwise.
    /// Every call settles before this returns.
    async fn fan_out(&self, command: &QueuedCommand, sessions: &[P::Session]) -> Vec<HostOutcome> {
        let local = self.local.as_ref();
        if command.kind() == CommandKind::Local || sessions.is_empty() {
            return vec![command.execute::<P::Session>(None, local).await];
        }

        join_all(
            sessions
                .iter()
                .map(|session| command.execute(Some(session), local)),
        )
        .await
    }

    async fn disconnect(&self, target: &str, sessions: Vec<P::Session>) -> Result<()> {
        let count = sessions.len();
        self.provider
            .terminate_all(sessions)
            .await
            .map_err(|source| OrchestratorError::ConnectionTeardownFailed {
                target: target.to_string(),
                source,
            })?;
        info!(connections = count, "Connections closed");
        Ok(())
    }
}

fn log_phase(phase: RunPhase) {
    debug!(phase = %phase, "Run phase");
}
