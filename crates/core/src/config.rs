// Probe configuration

use std::time::Duration;

use crate::application::constants::{
    DEFAULT_CPU_SAMPLE_WINDOW, DEFAULT_LOAD_PROGRAM, DEFAULT_SSH_CONFIG_PATH,
};

/// Tunables for RemoteSystemProbe
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Delay between the two /proc/stat reads of a CPU usage sample
    pub cpu_sample_window: Duration,
    /// Shell command pinned to each core by `generate_cpu_load`
    pub load_program: String,
    /// SSH client configuration edited by `enable_ssh_client_mode`
    pub ssh_config_path: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            cpu_sample_window: DEFAULT_CPU_SAMPLE_WINDOW,
            load_program: DEFAULT_LOAD_PROGRAM.to_string(),
            ssh_config_path: DEFAULT_SSH_CONFIG_PATH.to_string(),
        }
    }
}

impl ProbeConfig {
    pub fn with_cpu_sample_window(mut self, window: Duration) -> Self {
        self.cpu_sample_window = window;
        self
    }

    pub fn with_load_program(mut self, program: impl Into<String>) -> Self {
        self.load_program = program.into();
        self
    }

    pub fn with_ssh_config_path(mut self, path: impl Into<String>) -> Self {
        self.ssh_config_path = path.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProbeConfig::default();
        assert_eq!(config.cpu_sample_window, Duration::from_millis(5));
        assert_eq!(config.ssh_config_path, "/etc/ssh/ssh_config");
        assert!(config.load_program.contains("while"));
    }

    #[test]
    fn test_builder_overrides() {
        let config = ProbeConfig::default()
            .with_cpu_sample_window(Duration::ZERO)
            .with_load_program("yes")
            .with_ssh_config_path("/tmp/ssh_config");

        assert_eq!(config.cpu_sample_window, Duration::ZERO);
        assert_eq!(config.load_program, "yes");
        assert_eq!(config.ssh_config_path, "/tmp/ssh_config");
    }
}
