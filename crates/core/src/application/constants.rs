// Probe constants (no magic values in the operations)
use std::time::Duration;

/// Delay between the two /proc/stat reads of a CPU usage sample (5ms)
pub const DEFAULT_CPU_SAMPLE_WINDOW: Duration = Duration::from_millis(5);

/// Busy loop pinned to each core by generate_cpu_load
pub const DEFAULT_LOAD_PROGRAM: &str = "while :; do :; done";

/// SSH client configuration relaxed by enable_ssh_client_mode
pub const DEFAULT_SSH_CONFIG_PATH: &str = "/etc/ssh/ssh_config";

/// systemctl prints this when a restart does not go through
pub const RESTART_FAILURE_MARKERS: &[&str] = &["Failed"];

/// killall prints one of these when no process matched the name
pub const DAEMON_FAILURE_MARKERS: &[&str] = &["no process found", "no process killed"];
