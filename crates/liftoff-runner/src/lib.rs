//! # liftoff-runner
//!
//! Process backends and the `liftoff` command-line runner.
//!
//! [`LocalShell`] runs local commands through the system shell and
//! [`SshConnectionProvider`] opens one OpenSSH control master per host.
//! Targets and missions are read from a [`Rocketfile`].

pub mod config;
pub mod process;
pub mod renderer;
pub mod rocketfile;

pub use config::{ConfigError, RunnerConfig};
pub use process::{LocalShell, ProcessError, SshConnectionProvider, SshSession};
pub use renderer::render_run_report_as_tree;
pub use rocketfile::{Rocketfile, ScriptedMission, Step, DEFAULT_ROCKETFILE};

use liftoff_orchestrator::Orchestrator;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Orchestrator wired to the real ssh and shell backends
pub type SshOrchestrator = Orchestrator<SshConnectionProvider>;

/// Default log filter when neither `RUST_LOG` nor `LIFTOFF_LOG` is set
pub const DEFAULT_LOG_FILTER: &str = "liftoff_runner=info,liftoff_orchestrator=info";

/// Build an orchestrator from `config`
pub fn build_orchestrator(config: &RunnerConfig) -> SshOrchestrator {
    Orchestrator::new(
        SshConnectionProvider::new(config.clone()),
        LocalShell::from_config(config),
    )
}

/// Install the global tracing subscriber, logging to stderr
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_from_env("LIFTOFF_LOG"))
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
