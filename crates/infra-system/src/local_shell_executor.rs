// Local shell executor
// reason: tokio::process so a slow command never blocks the runtime
use async_trait::async_trait;
use std::collections::HashMap;
use std::process::{Output, Stdio};
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info};

use nodeprobe_core::port::{ExecutionError, RemoteExecutor, Shell};

/// Default deadline for one command (30s)
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Locale forced on every command so tool output stays parseable
const PARSEABLE_LOCALE: (&str, &str) = ("LC_ALL", "C");

/// Local shell executor configuration
#[derive(Debug, Clone)]
pub struct LocalShellConfig {
    /// Per-command deadline, None waits forever
    pub timeout: Option<Duration>,
    /// Environment variables passed through to the shell
    pub env_allowlist: Vec<String>,
}

impl Default for LocalShellConfig {
    fn default() -> Self {
        Self {
            timeout: Some(DEFAULT_COMMAND_TIMEOUT),
            env_allowlist: vec!["PATH".to_string(), "HOME".to_string(), "USER".to_string()],
        }
    }
}

/// Runs commands with `<shell> -c` on this host
///
/// Used when the probe runs on the node itself, and as the base for the ssh
/// adapter's process handling.
#[derive(Default)]
pub struct LocalShellExecutor {
    config: LocalShellConfig,
}

impl LocalShellExecutor {
    /// Create a new local shell executor
    ///
    /// # Example
    /// ```ignore
    /// let executor = LocalShellExecutor::new(LocalShellConfig {
    ///     timeout: Some(Duration::from_secs(5)),
    ///     ..Default::default()
    /// });
    /// ```
    pub fn new(config: LocalShellConfig) -> Self {
        Self { config }
    }

    /// Filter environment variables to allowlist only
    fn filter_env(&self, env: &HashMap<String, String>) -> HashMap<String, String> {
        env.iter()
            .filter(|(k, _)| self.config.env_allowlist.contains(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

#[async_trait]
impl RemoteExecutor for LocalShellExecutor {
    async fn execute(&self, command: &str, shell: Shell) -> Result<String, ExecutionError> {
        let env: HashMap<String, String> = std::env::vars().collect();

        let mut cmd = Command::new(shell.program());
        cmd.arg("-c")
            .arg(command)
            .env_clear()
            .envs(self.filter_env(&env))
            .env(PARSEABLE_LOCALE.0, PARSEABLE_LOCALE.1);

        run_to_completion(cmd, command, self.config.timeout).await
    }
}

/// Spawn `cmd`, wait under `deadline`, and map the exit status
///
/// stdout is returned on success; a failing status carries stdout followed by
/// stderr so callers can still look for failure text.
pub(crate) async fn run_to_completion(
    mut cmd: Command,
    label: &str,
    deadline: Option<Duration>,
) -> Result<String, ExecutionError> {
    let started = Instant::now();

    let child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| ExecutionError::SpawnFailed(e.to_string()))?;

    let output = match deadline {
        Some(limit) => match timeout(limit, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(ExecutionError::IoError(e.to_string())),
            Err(_) => return Err(ExecutionError::Timeout(limit.as_millis() as u64)),
        },
        None => child
            .wait_with_output()
            .await
            .map_err(|e| ExecutionError::IoError(e.to_string()))?,
    };

    let duration_ms = started.elapsed().as_millis() as u64;
    debug!(
        command = %label,
        duration_ms,
        exit_code = ?output.status.code(),
        "Command completed"
    );

    into_result(output, label)
}

fn into_result(output: Output, label: &str) -> Result<String, ExecutionError> {
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();

    if output.status.success() {
        return Ok(stdout);
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    info!(
        command = %label,
        exit_code = ?output.status.code(),
        "Command exited with failure status"
    );

    let mut combined = stdout;
    if !combined.is_empty() && !combined.ends_with('\n') {
        combined.push('\n');
    }
    combined.push_str(&stderr);

    Err(ExecutionError::NonZeroExit {
        code: output.status.code(),
        output: combined,
    })
}
