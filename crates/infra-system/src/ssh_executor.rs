// SSH executor
// reason: reuse the system ssh client (agent, known_hosts, ProxyJump) instead of an in-process stack
use async_trait::async_trait;
use std::borrow::Cow;
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use nodeprobe_core::port::{ExecutionError, RemoteExecutor, Shell};

use crate::local_shell_executor::{run_to_completion, DEFAULT_COMMAND_TIMEOUT};

/// ssh exits with 255 when the connection itself failed
const SSH_CONNECTION_FAILURE: i32 = 255;

/// Default TCP connect timeout handed to ssh (10s)
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Node reached through the ssh client
#[derive(Debug, Clone)]
pub struct SshTarget {
    pub host: String,
    pub user: Option<String>,
    pub port: Option<u16>,
    pub identity_file: Option<PathBuf>,
    pub connect_timeout_secs: u64,
}

impl SshTarget {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            user: None,
            port: None,
            identity_file: None,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// `~` is expanded against the local home directory
    pub fn with_identity_file(mut self, path: &str) -> Self {
        self.identity_file = Some(shellexpand::tilde(path).into_owned().into());
        self
    }

    /// Host and user end up as ssh arguments, so neither may look like an option
    pub fn validate(&self) -> Result<(), ExecutionError> {
        if self.host.is_empty() {
            return Err(ExecutionError::SpawnFailed("ssh host is empty".to_string()));
        }
        let fields = [Some(&self.host), self.user.as_ref()];
        match fields.into_iter().flatten().find(|f| f.starts_with('-')) {
            Some(field) => Err(ExecutionError::SpawnFailed(format!(
                "ssh destination field must not start with '-': {field:?}"
            ))),
            None => Ok(()),
        }
    }

    fn destination(&self) -> String {
        match &self.user {
            Some(user) => format!("{}@{}", user, self.host),
            None => self.host.clone(),
        }
    }
}

/// Runs commands on a remote node with `ssh <dest> <shell> -c '<command>'`
pub struct SshExecutor {
    target: SshTarget,
    timeout: Option<Duration>,
}

impl SshExecutor {
    pub fn new(target: SshTarget) -> Self {
        Self {
            target,
            timeout: Some(DEFAULT_COMMAND_TIMEOUT),
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn target(&self) -> &SshTarget {
        &self.target
    }

    /// Arguments passed to the local `ssh` binary
    fn build_args(&self, command: &str, shell: Shell) -> Vec<String> {
        let mut args = vec![
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", self.target.connect_timeout_secs),
        ];

        if let Some(port) = self.target.port {
            args.push("-p".to_string());
            args.push(port.to_string());
        }
        if let Some(identity) = &self.target.identity_file {
            args.push("-i".to_string());
            args.push(identity.to_string_lossy().into_owned());
        }

        args.push(self.target.destination());
        args.push("--".to_string());
        // ssh joins the remote words with spaces, so the command travels quoted
        args.push(format!(
            "LC_ALL=C {} -c {}",
            shell.program(),
            shell_escape::unix::escape(Cow::Borrowed(command))
        ));
        args
    }
}

#[async_trait]
impl RemoteExecutor for SshExecutor {
    async fn execute(&self, command: &str, shell: Shell) -> Result<String, ExecutionError> {
        self.target.validate()?;
        let args = self.build_args(command, shell);
        debug!(host = %self.target.host, command = %command, "Executing over ssh");

        let mut cmd = Command::new("ssh");
        cmd.args(&args);

        match run_to_completion(cmd, command, self.timeout).await {
            Err(ExecutionError::NonZeroExit {
                code: Some(SSH_CONNECTION_FAILURE),
                output,
            }) => Err(ExecutionError::IoError(format!(
                "ssh to {} failed: {}",
                self.target.host,
                output.trim()
            ))),
            other => other,
        }
    }
}
