// Load process handles and daemon signals

use serde::Serialize;
use tracing::{debug, warn};

use super::command;
use crate::error::{ProbeError, Result};
use crate::port::{RemoteExecutor, Shell};

/// Signal delivered by name through `killall`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DaemonSignal {
    Terminate,
    Suspend,
    Resume,
}

impl DaemonSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            DaemonSignal::Terminate => "TERM",
            DaemonSignal::Suspend => "STOP",
            DaemonSignal::Resume => "CONT",
        }
    }
}

/// Busy-loop process pinned to one core of the node
///
/// Owned by the caller: consume it with `terminate` (or `detach` to hand the
/// pid elsewhere). Dropping a live handle leaves the process spinning on the
/// node, which is logged as a leak.
#[derive(Debug, Serialize)]
#[must_use = "load processes keep running until terminated"]
pub struct LoadProcess {
    pid: u32,
    core: Option<u32>,
    #[serde(skip)]
    live: bool,
}

impl LoadProcess {
    pub fn new(pid: u32, core: u32) -> Self {
        Self {
            pid,
            core: Some(core),
            live: true,
        }
    }

    /// Take ownership of a pid spawned elsewhere, its core is unknown
    pub fn adopt(pid: u32) -> Self {
        Self {
            pid,
            core: None,
            live: true,
        }
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn core(&self) -> Option<u32> {
        self.core
    }

    /// Send SIGKILL to the process; the outcome is not verified
    pub async fn terminate(mut self, executor: &dyn RemoteExecutor) -> Result<()> {
        let cmd = command::kill_pid(self.pid);
        debug!(pid = self.pid, core = ?self.core, "Terminating load process");
        executor.execute(&cmd, Shell::Bash).await?;
        self.live = false;
        Ok(())
    }

    /// Give up ownership without signalling, returning the pid
    pub fn detach(mut self) -> u32 {
        self.live = false;
        self.pid
    }
}

impl Drop for LoadProcess {
    fn drop(&mut self) {
        if self.live {
            warn!(
                pid = self.pid,
                core = ?self.core,
                "Load process dropped without terminate, it keeps running on the node"
            );
        }
    }
}

/// Pid printed by a background spawn
///
/// Accepts a bare `12345` as well as the interactive job notice `[1] 12345`.
pub fn parse_spawned_pid(output: &str) -> Result<u32> {
    if output.to_ascii_lowercase().contains("failed") {
        return Err(ProbeError::operation_failed(format!(
            "could not start load process: {}",
            output.trim()
        )));
    }

    output
        .split_whitespace()
        .rev()
        .find_map(|t| t.parse::<u32>().ok())
        .ok_or_else(|| {
            ProbeError::operation_failed(format!("no pid in spawn response: {:?}", output.trim()))
        })
}
