// Remote command construction
// Fixed program tokens plus validated identifiers; free-form text is quoted.

use std::borrow::Cow;

use super::identifier::{DaemonName, ServiceName};
use super::process::DaemonSignal;
use super::unit::UnitState;

pub const READ_MEMINFO: &str = "cat /proc/meminfo";
pub const READ_STAT: &str = "cat /proc/stat";
pub const READ_CPUINFO: &str = "cat /proc/cpuinfo";

/// Single-quote `raw` for a POSIX shell
pub fn quote(raw: &str) -> Cow<'_, str> {
    shell_escape::unix::escape(Cow::Borrowed(raw))
}

/// `systemctl list-units --all [--state=<state>]`
pub fn list_units(state: Option<&UnitState>) -> String {
    match state {
        Some(state) => format!("systemctl list-units --all --state={}", state.as_str()),
        None => "systemctl list-units --all".to_string(),
    }
}

pub fn restart_unit(name: &ServiceName) -> String {
    format!("systemctl restart {name}")
}

/// Pin `program` to `core` in the background and print the new pid
///
/// The backgrounded spawn cannot report its own exit status, so the
/// affinity is tried first with `true`; when that fails the response is
/// taskset's error followed by a `failed to pin` line instead of a pid.
pub fn spawn_pinned_load(core: u32, program: &str) -> String {
    format!(
        "if taskset --cpu-list {core} true 2>&1; \
         then taskset --cpu-list {core} sh -c {} >/dev/null 2>&1 & echo $!; \
         else echo 'failed to pin load to core {core}'; fi",
        quote(program)
    )
}

pub fn kill_pid(pid: u32) -> String {
    format!("kill -9 {pid}")
}

pub fn signal_daemon(signal: DaemonSignal, name: &DaemonName) -> String {
    format!("killall -{} {name}", signal.as_str())
}

/// In-place edit disabling host key prompts for the ssh client
pub fn relax_ssh_client(config_path: &str) -> String {
    format!(
        "sed -i \
         -e 's/^#\\?\\s*StrictHostKeyChecking.*/StrictHostKeyChecking no/' \
         -e 's|^#\\?\\s*UserKnownHostsFile.*|UserKnownHostsFile /dev/null|' \
         {}",
        quote(config_path)
    )
}
