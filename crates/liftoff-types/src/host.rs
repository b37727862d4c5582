//! Per-host connection configuration
//!
//! A target is an ordered list of these. The orchestrator never looks inside
//! them; they are handed as-is to the connection provider.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default ssh port
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Connection settings for a single remote host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostConfig {
    /// Hostname or IP address
    pub host: String,
    /// Port the ssh daemon listens on
    #[serde(default = "default_port")]
    pub port: u16,
    /// Login user, ssh defaults apply when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Private key used for authentication
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_file: Option<PathBuf>,
    /// Extra `-o Key=Value` options passed to ssh
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

fn default_port() -> u16 {
    DEFAULT_SSH_PORT
}

impl HostConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_SSH_PORT,
            username: None,
            identity_file: None,
            options: Vec::new(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_identity_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.identity_file = Some(path.into());
        self
    }

    pub fn with_option(mut self, option: impl Into<String>) -> Self {
        self.options.push(option.into());
        self
    }

    /// `user@host`, or just `host` when no user is configured
    pub fn destination(&self) -> String {
        match &self.username {
            Some(user) => format!("{user}@{}", self.host),
            None => self.host.clone(),
        }
    }

    /// Label used in logs and reports
    pub fn label(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
