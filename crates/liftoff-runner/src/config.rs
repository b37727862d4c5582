//! Configuration for the runner's process backends

use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Configuration for the local shell and the ssh provider
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// ssh client executable
    pub ssh_binary: String,

    /// Shell used for local commands, invoked as `<shell> -c <command>`
    pub shell: String,

    /// Timeout for opening one ssh session
    pub connect_timeout: Duration,

    /// Timeout for one command execution, unlimited when `None`
    pub command_timeout: Option<Duration>,

    /// Directory holding ssh control sockets
    pub control_dir: PathBuf,

    /// Value for ssh's `StrictHostKeyChecking`
    pub strict_host_key_checking: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            ssh_binary: "ssh".to_string(),
            shell: "sh".to_string(),
            connect_timeout: Duration::from_secs(30),
            command_timeout: None,
            control_dir: std::env::temp_dir().join("liftoff-ssh"),
            strict_host_key_checking: "accept-new".to_string(),
        }
    }
}

impl RunnerConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(binary) = std::env::var("LIFTOFF_SSH_BINARY") {
            config.ssh_binary = binary;
        }

        if let Ok(shell) = std::env::var("LIFTOFF_SHELL") {
            config.shell = shell;
        }

        if let Some(secs) = parse_secs("LIFTOFF_CONNECT_TIMEOUT_SECS") {
            config.connect_timeout = Duration::from_secs(secs);
        }

        if let Some(secs) = parse_secs("LIFTOFF_COMMAND_TIMEOUT_SECS") {
            // 0 means no timeout
            config.command_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        if let Ok(dir) = std::env::var("LIFTOFF_CONTROL_DIR") {
            config.control_dir = PathBuf::from(dir);
        }

        if let Ok(value) = std::env::var("LIFTOFF_STRICT_HOST_KEY_CHECKING") {
            config.strict_host_key_checking = value;
        }

        config
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = Some(timeout);
        self
    }

    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ssh_binary.trim().is_empty() {
            return Err(ConfigError::Invalid {
                message: "ssh binary must not be empty".to_string(),
            });
        }
        if self.shell.trim().is_empty() {
            return Err(ConfigError::Invalid {
                message: "shell must not be empty".to_string(),
            });
        }
        if self.connect_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                message: "connect timeout must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

fn parse_secs(var: &str) -> Option<u64> {
    let value = std::env::var(var).ok()?;
    match value.trim().parse::<u64>() {
        Ok(secs) => Some(secs),
        Err(_) => {
            warn!(variable = var, value = %value, "Ignoring malformed number of seconds");
            None
        }
    }
}
