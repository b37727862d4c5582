//! Test fixtures for orchestrator tests
//!
//! Recording doubles for the connection provider, sessions and the local
//! executor. Every call is appended to a shared event log so tests can assert
//! on ordering.

#![allow(dead_code)]

use anyhow::{anyhow, Result};
use liftoff_orchestrator::{
    ConnectionProvider, LocalExecutor, MissionContext, Orchestrator, Session,
};
use liftoff_types::CommandOutput;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Something a collaborator was asked to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Connect(Vec<String>),
    Start { host: String, command: String },
    End { host: String, command: String },
    Disconnect(Vec<String>),
}

/// Shared, ordered event log
#[derive(Debug, Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<Event>>>);

impl EventLog {
    pub fn push(&self, event: Event) {
        self.0.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.lock().unwrap().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock().unwrap().is_empty()
    }

    /// Positions of every `Start` for `command`
    pub fn starts_of(&self, command: &str) -> Vec<usize> {
        self.positions(|e| matches!(e, Event::Start { command: c, .. } if c == command))
    }

    /// Positions of every `End` for `command`
    pub fn ends_of(&self, command: &str) -> Vec<usize> {
        self.positions(|e| matches!(e, Event::End { command: c, .. } if c == command))
    }

    /// Hosts that started `command`, in start order
    pub fn hosts_for(&self, command: &str) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Start { host, command: c } if c == command => Some(host),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, predicate: impl Fn(&Event) -> bool) -> usize {
        self.events().iter().filter(|e| predicate(e)).count()
    }

    fn positions(&self, predicate: impl Fn(&Event) -> bool) -> Vec<usize> {
        self.events()
            .iter()
            .enumerate()
            .filter(|(_, e)| predicate(e))
            .map(|(i, _)| i)
            .collect()
    }
}

/// How a session reacts to one command
#[derive(Debug, Clone, Copy)]
pub enum Failure {
    /// The command runs but exits non-zero
    ExitCode(i32),
    /// The transport errors out
    Transport,
}

/// Session double keyed by host name
pub struct MockSession {
    host: String,
    log: EventLog,
    delay: Duration,
    failures: HashMap<String, Failure>,
}

#[async_trait::async_trait]
impl Session for MockSession {
    fn host(&self) -> &str {
        &self.host
    }

    async fn exec(&self, command: &str) -> Result<CommandOutput> {
        self.log.push(Event::Start {
            host: self.host.clone(),
            command: command.to_string(),
        });
        tokio::time::sleep(self.delay).await;
        self.log.push(Event::End {
            host: self.host.clone(),
            command: command.to_string(),
        });

        match self.failures.get(command) {
            Some(Failure::ExitCode(code)) => Ok(CommandOutput::failure(*code, "boom")),
            Some(Failure::Transport) => Err(anyhow!("connection reset by {}", self.host)),
            None => Ok(CommandOutput::success(format!("{} ran {command}", self.host))),
        }
    }
}

/// Provider double; configs are plain host names
#[derive(Default)]
pub struct MockProvider {
    pub log: EventLog,
    pub fail_establish: bool,
    pub fail_teardown: bool,
    delays: HashMap<String, Duration>,
    failures: HashMap<String, HashMap<String, Failure>>,
}

impl MockProvider {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            ..Default::default()
        }
    }

    pub fn with_delay(mut self, host: &str, delay: Duration) -> Self {
        self.delays.insert(host.to_string(), delay);
        self
    }

    pub fn with_failure(mut self, host: &str, command: &str, failure: Failure) -> Self {
        self.failures
            .entry(host.to_string())
            .or_default()
            .insert(command.to_string(), failure);
        self
    }

    pub fn failing_establish(mut self) -> Self {
        self.fail_establish = true;
        self
    }

    pub fn failing_teardown(mut self) -> Self {
        self.fail_teardown = true;
        self
    }
}

#[async_trait::async_trait]
impl ConnectionProvider for MockProvider {
    type Config = String;
    type Session = MockSession;

    async fn establish_all(&self, configs: &[String]) -> Result<Vec<MockSession>> {
        if self.fail_establish {
            return Err(anyhow!("authentication failed for {}", configs[0]));
        }
        self.log.push(Event::Connect(configs.to_vec()));
        Ok(configs
            .iter()
            .map(|host| MockSession {
                host: host.clone(),
                log: self.log.clone(),
                delay: self
                    .delays
                    .get(host)
                    .copied()
                    .unwrap_or(Duration::from_millis(5)),
                failures: self.failures.get(host).cloned().unwrap_or_default(),
            })
            .collect())
    }

    async fn terminate_all(&self, sessions: Vec<MockSession>) -> Result<()> {
        self.log.push(Event::Disconnect(
            sessions.iter().map(|s| s.host.clone()).collect(),
        ));
        if self.fail_teardown {
            return Err(anyhow!("control socket vanished"));
        }
        Ok(())
    }
}

/// Local executor double, records under the host name `local`
#[derive(Default)]
pub struct MockLocal {
    pub log: EventLog,
    pub failing: Vec<String>,
}

impl MockLocal {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            failing: Vec::new(),
        }
    }

    /// Make `command` exit with status 2
    pub fn with_failing(mut self, command: &str) -> Self {
        self.failing.push(command.to_string());
        self
    }
}

#[async_trait::async_trait]
impl LocalExecutor for MockLocal {
    async fn exec(&self, command: &str) -> Result<CommandOutput> {
        self.log.push(Event::Start {
            host: "local".to_string(),
            command: command.to_string(),
        });
        self.log.push(Event::End {
            host: "local".to_string(),
            command: command.to_string(),
        });
        if self.failing.iter().any(|c| c == command) {
            return Ok(CommandOutput::failure(2, "local failure"));
        }
        Ok(CommandOutput::success(command.to_string()))
    }
}

/// Orchestrator wired to doubles that share one log
pub fn orchestrator_with(provider: MockProvider) -> (Orchestrator<MockProvider>, EventLog) {
    let log = provider.log.clone();
    let local = MockLocal::new(log.clone());
    (Orchestrator::new(provider, local), log)
}

/// Orchestrator with a fresh log and default doubles
pub fn orchestrator() -> (Orchestrator<MockProvider>, EventLog) {
    orchestrator_with(MockProvider::new(EventLog::default()))
}

pub fn hosts(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

/// Mission body queueing the given remote commands
pub fn remote_mission(
    commands: &'static [&'static str],
) -> impl Fn(&mut MissionContext) -> anyhow::Result<()> + Send + Sync {
    move |ctx: &mut MissionContext| {
        for cmd in commands {
            ctx.remote(cmd);
        }
        Ok(())
    }
}
