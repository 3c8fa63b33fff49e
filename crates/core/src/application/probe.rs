// RemoteSystemProbe - entry point for every node operation
use std::sync::Arc;
use tracing::debug;

use crate::config::ProbeConfig;
use crate::error::{ProbeError, Result};
use crate::port::{RemoteExecutor, Shell};

/// Stateless set of node operations over an injected executor
///
/// Each operation sends its commands one after another and parses the text
/// that comes back. Nothing is cached between calls.
///
/// # Example
/// ```ignore
/// let probe = RemoteSystemProbe::new(Arc::new(LocalShellExecutor::default()));
/// if let Some(failed) = probe.list_failed_services().await? {
///     eprintln!("failed units: {failed:?}");
/// }
/// ```
#[derive(Clone)]
pub struct RemoteSystemProbe {
    pub(crate) executor: Arc<dyn RemoteExecutor>,
    pub(crate) config: ProbeConfig,
}

impl RemoteSystemProbe {
    pub fn new(executor: Arc<dyn RemoteExecutor>) -> Self {
        Self::with_config(executor, ProbeConfig::default())
    }

    pub fn with_config(executor: Arc<dyn RemoteExecutor>, config: ProbeConfig) -> Self {
        Self { executor, config }
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    pub fn executor(&self) -> &dyn RemoteExecutor {
        self.executor.as_ref()
    }

    /// Send one command, transport errors propagate unchanged
    pub(crate) async fn run(&self, cmd: &str) -> Result<String> {
        debug!(command = %cmd, "Sending remote command");
        let output = self.executor.execute(cmd, Shell::Bash).await?;
        Ok(output)
    }

    /// Send one command and turn textual failure markers into OperationFailed
    ///
    /// Markers are looked up in the output of successful runs as well as in
    /// the captured output of non-zero exits.
    pub(crate) async fn run_expecting(&self, cmd: &str, failure_markers: &[&str]) -> Result<String> {
        debug!(command = %cmd, "Sending remote command");
        match self.executor.execute(cmd, Shell::Bash).await {
            Ok(output) => match find_marker(&output, failure_markers) {
                Some(marker) => Err(reported_failure(cmd, marker, &output)),
                None => Ok(output),
            },
            Err(err) => match err.output().and_then(|o| find_marker(o, failure_markers)) {
                Some(marker) => Err(reported_failure(cmd, marker, err.output().unwrap_or_default())),
                None => Err(err.into()),
            },
        }
    }
}

fn find_marker<'a>(output: &str, markers: &[&'a str]) -> Option<&'a str> {
    markers.iter().copied().find(|m| output.contains(m))
}

fn reported_failure(cmd: &str, marker: &str, output: &str) -> ProbeError {
    ProbeError::operation_failed(format!(
        "`{cmd}` reported {marker:?}: {}",
        output.trim()
    ))
}
