//! ssh connection provider
//!
//! Each session is an OpenSSH control master kept alive as a child process.
//! Commands are multiplexed over its control socket, so authentication
//! happens once per host per run.

use super::{run_captured, ProcessError};
use crate::config::RunnerConfig;
use anyhow::{anyhow, Result};
use futures::future::join_all;
use liftoff_orchestrator::{ConnectionProvider, Session};
use liftoff_types::{CommandOutput, HostConfig};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, Command};
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

const READY_POLL_INTERVAL: Duration = Duration::from_millis(200);
const CHECK_TIMEOUT: Duration = Duration::from_secs(5);
const MASTER_EXIT_TIMEOUT: Duration = Duration::from_secs(5);
/// Lines of master stderr kept for error messages
const STDERR_TAIL_LINES: usize = 20;

/// An open control master for one host
pub struct SshSession {
    host: HostConfig,
    label: String,
    control_path: PathBuf,
    ssh_binary: String,
    command_timeout: Option<Duration>,
    /// The master process; killed on drop
    master: Mutex<Option<Child>>,
}

impl SshSession {
    pub fn config(&self) -> &HostConfig {
        &self.host
    }

    pub fn control_path(&self) -> &Path {
        &self.control_path
    }

    fn take_master(&self) -> Option<Child> {
        match self.master.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }
}

impl std::fmt::Debug for SshSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshSession")
            .field("host", &self.label)
            .field("control_path", &self.control_path)
            .finish()
    }
}

#[async_trait::async_trait]
impl Session for SshSession {
    fn host(&self) -> &str {
        &self.label
    }

    async fn exec(&self, command: &str) -> Result<CommandOutput> {
        debug!(host = %self.label, command = %command, "Running remote command");
        let mut process = client_command(&self.ssh_binary, &self.host, &self.control_path);
        process
            .arg(self.host.destination())
            .arg("--")
            .arg(command);
        Ok(run_captured(process, self.command_timeout).await?)
    }
}

/// Opens one control master per host with the system ssh client
#[derive(Debug, Clone)]
pub struct SshConnectionProvider {
    config: RunnerConfig,
}

impl SshConnectionProvider {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Arguments that start a control master for `host`
    pub fn master_args(&self, host: &HostConfig, control_path: &Path) -> Vec<String> {
        let mut args = vec![
            "-M".to_string(),
            "-N".to_string(),
            "-o".to_string(),
            "ControlPersist=no".to_string(),
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", self.config.connect_timeout.as_secs().max(1)),
            "-o".to_string(),
            format!(
                "StrictHostKeyChecking={}",
                self.config.strict_host_key_checking
            ),
        ];
        args.extend(connection_args(host, control_path));
        args.push(host.destination());
        args
    }

    async fn open(&self, host: &HostConfig) -> Result<SshSession, ProcessError> {
        let label = host.label();
        let control_path = self
            .config
            .control_dir
            .join(format!("{}.sock", Uuid::new_v4().simple()));

        let mut child = Command::new(&self.config.ssh_binary)
            .args(self.master_args(host, &control_path))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ProcessError::SpawnError {
                program: self.config.ssh_binary.clone(),
                source,
            })?;
        debug!(host = %label, pid = ?child.id(), "Started ssh control master");

        // Read for the master's whole life so its stderr pipe never fills up
        let mut stderr_tail = child
            .stderr
            .take()
            .map(|stderr| tokio::spawn(drain_stderr(label.clone(), stderr)));

        let deadline = Instant::now() + self.config.connect_timeout;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    let stderr = match stderr_tail.take() {
                        Some(task) => timeout(CHECK_TIMEOUT, task)
                            .await
                            .ok()
                            .and_then(|joined| joined.ok())
                            .unwrap_or_default(),
                        None => String::new(),
                    };
                    return Err(ProcessError::SshError {
                        host: label,
                        message: if stderr.is_empty() {
                            format!("control master exited with {status}")
                        } else {
                            stderr
                        },
                    });
                }
                Ok(None) => {}
                Err(e) => {
                    return Err(ProcessError::SshError {
                        host: label,
                        message: format!("failed to poll control master: {e}"),
                    })
                }
            }

            if self.check(host, &control_path).await {
                break;
            }

            if Instant::now() >= deadline {
                // kill_on_drop takes the master down with `child`
                return Err(ProcessError::SshError {
                    host: label,
                    message: format!(
                        "control socket not ready after {}s",
                        self.config.connect_timeout.as_secs()
                    ),
                });
            }
            sleep(READY_POLL_INTERVAL).await;
        }

        info!(host = %label, "ssh session established");
        Ok(SshSession {
            host: host.clone(),
            label,
            control_path,
            ssh_binary: self.config.ssh_binary.clone(),
            command_timeout: self.config.command_timeout,
            master: Mutex::new(Some(child)),
        })
    }

    /// True once the master answers on its control socket
    async fn check(&self, host: &HostConfig, control_path: &Path) -> bool {
        let mut process = Command::new(&self.config.ssh_binary);
        process
            .args(["-O", "check", "-o"])
            .arg(format!("ControlPath={}", control_path.display()))
            .arg(host.destination());
        matches!(
            run_captured(process, Some(CHECK_TIMEOUT)).await,
            Ok(output) if output.is_success()
        )
    }

    async fn close(&self, session: SshSession) -> Result<(), ProcessError> {
        let mut process = Command::new(&self.config.ssh_binary);
        process
            .args(["-O", "exit", "-o"])
            .arg(format!("ControlPath={}", session.control_path.display()))
            .arg(session.host.destination());
        let exit = run_captured(process, Some(CHECK_TIMEOUT)).await;

        if let Some(mut master) = session.take_master() {
            if timeout(MASTER_EXIT_TIMEOUT, master.wait()).await.is_err() {
                warn!(host = %session.label, "Control master did not exit, killing it");
                if let Err(e) = master.kill().await {
                    error!(host = %session.label, error = %e, "Failed to kill control master");
                }
            }
        }

        match exit {
            Ok(output) if output.is_success() => {
                debug!(host = %session.label, "ssh session closed");
                Ok(())
            }
            Ok(output) => Err(ProcessError::SshError {
                host: session.label.clone(),
                message: format!("-O exit failed: {}", output.stderr.trim()),
            }),
            Err(e) => Err(e),
        }
    }
}

#[async_trait::async_trait]
impl ConnectionProvider for SshConnectionProvider {
    type Config = HostConfig;
    type Session = SshSession;

    #[instrument(skip_all, fields(hosts = configs.len()))]
    async fn establish_all(&self, configs: &[HostConfig]) -> Result<Vec<SshSession>> {
        tokio::fs::create_dir_all(&self.config.control_dir)
            .await
            .map_err(|e| {
                anyhow!(
                    "Failed to create control directory {}: {e}",
                    self.config.control_dir.display()
                )
            })?;

        let results = join_all(configs.iter().map(|host| self.open(host))).await;

        let mut sessions = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(session) => sessions.push(session),
                Err(e) => {
                    error!(error = %e, "Failed to open ssh session");
                    failures.push(e.to_string());
                }
            }
        }

        if failures.is_empty() {
            return Ok(sessions);
        }

        if !sessions.is_empty() {
            warn!(
                open = sessions.len(),
                "Closing sessions opened before the failure"
            );
            for result in join_all(sessions.into_iter().map(|s| self.close(s))).await {
                if let Err(e) = result {
                    error!(error = %e, "Failed to close ssh session");
                }
            }
        }

        Err(anyhow!(failures.join("; ")))
    }

    #[instrument(skip_all, fields(sessions = sessions.len()))]
    async fn terminate_all(&self, sessions: Vec<SshSession>) -> Result<()> {
        let failures: Vec<String> = join_all(sessions.into_iter().map(|s| self.close(s)))
            .await
            .into_iter()
            .filter_map(|result| result.err().map(|e| e.to_string()))
            .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(anyhow!(failures.join("; ")))
        }
    }
}

/// Options shared by the master and every multiplexed client
fn connection_args(host: &HostConfig, control_path: &Path) -> Vec<String> {
    let mut args = vec![
        "-o".to_string(),
        format!("ControlPath={}", control_path.display()),
        "-p".to_string(),
        host.port.to_string(),
    ];
    if let Some(identity) = &host.identity_file {
        args.push("-i".to_string());
        args.push(identity.display().to_string());
    }
    for option in &host.options {
        args.push("-o".to_string());
        args.push(option.clone());
    }
    args
}

/// An ssh client command that reuses the session's control socket
fn client_command(ssh_binary: &str, host: &HostConfig, control_path: &Path) -> Command {
    let mut command = Command::new(ssh_binary);
    command
        .args(["-o", "BatchMode=yes"])
        .args(connection_args(host, control_path));
    command
}

/// Log every line the master writes and return the last few
async fn drain_stderr(host: String, stderr: ChildStderr) -> String {
    let mut lines = BufReader::new(stderr).lines();
    let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                debug!(host = %host, "ssh: {line}");
                if tail.len() == STDERR_TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line);
            }
            Ok(None) => break,
            Err(e) => {
                debug!(host = %host, error = %e, "Failed to read ssh stderr");
                break;
            }
        }
    }
    Vec::from(tail).join("\n").trim().to_string()
}
