// CPU load generation
use tracing::{info, warn};

use super::RemoteSystemProbe;
use crate::domain::command;
use crate::domain::cpu;
use crate::domain::process::{self, LoadProcess};
use crate::error::{ProbeError, Result};

impl RemoteSystemProbe {
    /// Core count from /proc/cpuinfo
    pub async fn count_cores(&self) -> Result<u32> {
        let output = self.run(command::READ_CPUINFO).await?;
        cpu::count_processors(&output)
    }

    /// Pin one busy loop to every core of the node
    ///
    /// The caller owns the returned handles and must pass them to
    /// `stop_cpu_load`. When a spawn fails, the processes already started are
    /// terminated before the error is returned.
    pub async fn generate_cpu_load(&self) -> Result<Vec<LoadProcess>> {
        let cores = self.count_cores().await?;
        let mut spawned = Vec::with_capacity(cores as usize);

        for core in 0..cores {
            match self.spawn_on_core(core).await {
                Ok(process) => spawned.push(process),
                Err(e) => {
                    warn!(core, error = %e, "Load spawn failed, terminating started processes");
                    self.abandon(spawned).await;
                    return Err(e);
                }
            }
        }

        info!(cores, "CPU load started");
        Ok(spawned)
    }

    /// Terminate every handle; the signal outcome is not verified
    ///
    /// All handles are attempted. The first transport error, if any, is
    /// returned once the loop is done.
    pub async fn stop_cpu_load(&self, handles: Vec<LoadProcess>) -> Result<()> {
        if handles.is_empty() {
            return Err(ProbeError::invalid_argument("load process list is empty"));
        }

        let count = handles.len();
        let mut first_error = None;
        for handle in handles {
            let pid = handle.pid();
            if let Err(e) = handle.terminate(self.executor()).await {
                warn!(pid, error = %e, "Failed to signal load process");
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => {
                info!(processes = count, "CPU load stopped");
                Ok(())
            }
        }
    }

    async fn spawn_on_core(&self, core: u32) -> Result<LoadProcess> {
        let cmd = command::spawn_pinned_load(core, &self.config.load_program);
        let output = self.run(&cmd).await?;
        let pid = process::parse_spawned_pid(&output)?;
        Ok(LoadProcess::new(pid, core))
    }

    async fn abandon(&self, spawned: Vec<LoadProcess>) {
        for process in spawned {
            let pid = process.pid();
            if let Err(e) = process.terminate(self.executor()).await {
                warn!(pid, error = %e, "Cleanup of load process failed");
            }
        }
    }
}
