// Remote Executor Port
// Abstraction over "run a shell command on a node and return its text output"

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Shell used to interpret a command string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Shell {
    Bash,
}

impl Shell {
    /// Program name to invoke with `-c`
    pub fn program(&self) -> &'static str {
        match self {
            Shell::Bash => "bash",
        }
    }
}

impl fmt::Display for Shell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}

/// Execution errors raised by executor adapters
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("Spawn failed: {0}")]
    SpawnFailed(String),

    #[error("Command timeout after {0}ms")]
    Timeout(u64),

    /// Command ran but exited non-zero; `output` holds stdout followed by stderr
    #[error("Command exited with status {code:?}: {output}")]
    NonZeroExit { code: Option<i32>, output: String },

    #[error("IO error: {0}")]
    IoError(String),
}

impl ExecutionError {
    /// Text the command printed before failing, if it ran at all
    pub fn output(&self) -> Option<&str> {
        match self {
            ExecutionError::NonZeroExit { output, .. } => Some(output),
            _ => None,
        }
    }
}

/// Remote Executor trait
///
/// Implementations:
/// - LocalShellExecutor: `bash -c` on this host
/// - SshExecutor: `bash -c` on a node reached through the ssh client
#[async_trait]
pub trait RemoteExecutor: Send + Sync {
    /// Run `command` through `shell` and return its stdout
    ///
    /// # Errors
    /// - ExecutionError::SpawnFailed if the shell cannot be started
    /// - ExecutionError::Timeout if the command exceeds the adapter's deadline
    /// - ExecutionError::NonZeroExit if the command exits with a failure status
    async fn execute(&self, command: &str, shell: Shell) -> Result<String, ExecutionError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    struct Rule {
        pattern: String,
        responses: VecDeque<Result<String, ExecutionError>>,
    }

    /// Scripted executor replaying canned responses
    ///
    /// A command is answered by the first rule whose pattern it contains.
    /// Rules with several responses hand them out in order and then keep
    /// repeating the last one. Unmatched commands return empty output.
    #[derive(Clone, Default)]
    pub struct ScriptedExecutor {
        rules: Arc<Mutex<Vec<Rule>>>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedExecutor {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(self, pattern: impl Into<String>, output: impl Into<String>) -> Self {
            self.push(pattern.into(), Ok(output.into()))
        }

        pub fn respond_err(self, pattern: impl Into<String>, err: ExecutionError) -> Self {
            self.push(pattern.into(), Err(err))
        }

        fn push(self, pattern: String, response: Result<String, ExecutionError>) -> Self {
            {
                let mut rules = self.rules.lock().unwrap();
                match rules.iter_mut().find(|r| r.pattern == pattern) {
                    Some(rule) => rule.responses.push_back(response),
                    None => rules.push(Rule {
                        pattern,
                        responses: VecDeque::from([response]),
                    }),
                }
            }
            self
        }

        /// Every command received, in order
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        /// Commands containing `pattern`
        pub fn calls_matching(&self, pattern: &str) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|c| c.contains(pattern))
                .cloned()
                .collect()
        }
    }

    #[async_trait]
    impl RemoteExecutor for ScriptedExecutor {
        async fn execute(&self, command: &str, _shell: Shell) -> Result<String, ExecutionError> {
            self.calls.lock().unwrap().push(command.to_string());

            let mut rules = self.rules.lock().unwrap();
            let Some(rule) = rules.iter_mut().find(|r| command.contains(&r.pattern)) else {
                return Ok(String::new());
            };

            if rule.responses.len() > 1 {
                rule.responses.pop_front().unwrap_or_else(|| Ok(String::new()))
            } else {
                rule.responses.front().cloned().unwrap_or_else(|| Ok(String::new()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mocks::ScriptedExecutor;
    use super::*;

    #[tokio::test]
    async fn test_scripted_responses_in_order_then_repeat() {
        let exec = ScriptedExecutor::new()
            .respond("cat /proc/stat", "first")
            .respond("cat /proc/stat", "second");

        assert_eq!(exec.execute("cat /proc/stat", Shell::Bash).await.unwrap(), "first");
        assert_eq!(exec.execute("cat /proc/stat", Shell::Bash).await.unwrap(), "second");
        assert_eq!(exec.execute("cat /proc/stat", Shell::Bash).await.unwrap(), "second");
        assert_eq!(exec.call_count(), 3);
    }

    #[tokio::test]
    async fn test_unmatched_command_returns_empty() {
        let exec = ScriptedExecutor::new();
        assert_eq!(exec.execute("uptime", Shell::Bash).await.unwrap(), "");
        assert_eq!(exec.calls(), vec!["uptime".to_string()]);
    }

    #[tokio::test]
    async fn test_scripted_error() {
        let exec = ScriptedExecutor::new()
            .respond_err("killall", ExecutionError::Timeout(10));

        let result = exec.execute("killall -TERM sshd", Shell::Bash).await;
        assert_eq!(result, Err(ExecutionError::Timeout(10)));
    }

    #[test]
    fn test_non_zero_exit_exposes_output() {
        let err = ExecutionError::NonZeroExit {
            code: Some(1),
            output: "sshd: no process found".to_string(),
        };
        assert_eq!(err.output(), Some("sshd: no process found"));
        assert_eq!(ExecutionError::Timeout(5).output(), None);
        assert_eq!(Shell::Bash.to_string(), "bash");
    }
}
