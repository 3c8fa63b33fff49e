// Host configuration
use tracing::info;

use super::RemoteSystemProbe;
use crate::domain::command;
use crate::error::Result;

impl RemoteSystemProbe {
    /// Turn off host key prompts in the node's ssh client configuration
    ///
    /// Best effort: the edit itself is not verified, only transport errors
    /// are reported.
    pub async fn enable_ssh_client_mode(&self) -> Result<()> {
        let path = &self.config.ssh_config_path;
        self.run(&command::relax_ssh_client(path)).await?;

        info!(path = %path, "SSH client mode enabled");
        Ok(())
    }
}
