use super::run_captured;
use crate::config::RunnerConfig;
use anyhow::Result;
use liftoff_orchestrator::LocalExecutor;
use liftoff_types::CommandOutput;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Runs local commands through `<shell> -c`
#[derive(Debug, Clone)]
pub struct LocalShell {
    shell: String,
    timeout: Option<Duration>,
}

impl LocalShell {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
            timeout: None,
        }
    }

    pub fn from_config(config: &RunnerConfig) -> Self {
        Self {
            shell: config.shell.clone(),
            timeout: config.command_timeout,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Default for LocalShell {
    fn default() -> Self {
        Self::new("sh")
    }
}

#[async_trait::async_trait]
impl LocalExecutor for LocalShell {
    async fn exec(&self, command: &str) -> Result<CommandOutput> {
        debug!(shell = %self.shell, command = %command, "Running local command");
        let mut process = Command::new(&self.shell);
        process.arg("-c").arg(command);
        Ok(run_captured(process, self.timeout).await?)
    }
}
