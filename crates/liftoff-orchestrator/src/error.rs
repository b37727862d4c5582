use thiserror::Error;

/// Errors raised by the orchestrator
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// A mission or target was registered under an empty name
    #[error("Invalid {kind} name: names must not be empty")]
    InvalidName { kind: &'static str },

    #[error("Mission '{mission}' was not found")]
    MissionNotFound { mission: String },

    #[error("Target '{target}' was not found")]
    TargetNotFound { target: String },

    #[error("Failed to connect to target '{target}': {source}")]
    ConnectionEstablishmentFailed {
        target: String,
        source: anyhow::Error,
    },

    #[error("Failed to disconnect from target '{target}': {source}")]
    ConnectionTeardownFailed {
        target: String,
        source: anyhow::Error,
    },

    #[error("Failed executing command '{command}' on {host}: {reason}")]
    CommandExecutionFailed {
        command: String,
        host: String,
        reason: String,
    },

    /// The mission body itself returned an error before the drain
    #[error("Mission '{mission}' failed: {source}")]
    MissionFailed {
        mission: String,
        source: anyhow::Error,
    },
}

impl OrchestratorError {
    /// True for the lookup errors raised before any side effect
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissionNotFound { .. } | Self::TargetNotFound { .. }
        )
    }
}

/// Result type for orchestrator operations
pub type Result<T> = std::result::Result<T, OrchestratorError>;
