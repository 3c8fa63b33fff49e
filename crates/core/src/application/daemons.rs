// Daemon control through name-based signals
use tracing::info;

use super::constants::DAEMON_FAILURE_MARKERS;
use super::RemoteSystemProbe;
use crate::domain::command;
use crate::domain::identifier::{self, DaemonName};
use crate::domain::process::DaemonSignal;
use crate::error::Result;

impl RemoteSystemProbe {
    /// SIGTERM every process matching each name
    pub async fn kill_daemons<S: AsRef<str>>(&self, names: &[S]) -> Result<()> {
        self.signal_daemons(names, DaemonSignal::Terminate).await
    }

    /// SIGSTOP every process matching each name
    pub async fn halt_daemons<S: AsRef<str>>(&self, names: &[S]) -> Result<()> {
        self.signal_daemons(names, DaemonSignal::Suspend).await
    }

    /// SIGCONT every process matching each name
    pub async fn resume_daemons<S: AsRef<str>>(&self, names: &[S]) -> Result<()> {
        self.signal_daemons(names, DaemonSignal::Resume).await
    }

    /// All names are validated before the first signal goes out
    pub async fn signal_daemons<S: AsRef<str>>(&self, names: &[S], signal: DaemonSignal) -> Result<()> {
        let names = identifier::parse_all("daemon", names, DaemonName::parse)?;

        for name in &names {
            self.run_expecting(&command::signal_daemon(signal, name), DAEMON_FAILURE_MARKERS)
                .await?;
            info!(daemon = %name, signal = signal.as_str(), "Daemon signalled");
        }
        Ok(())
    }
}
