//! End-to-end probe workflows against a simulated node
//!
//! FakeNode keeps process, daemon, unit and memory state and answers the
//! commands the probe sends the way the real tools would.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use nodeprobe_core::domain::UnitState;
use nodeprobe_core::port::{ExecutionError, RemoteExecutor, Shell};
use nodeprobe_core::{ProbeConfig, ProbeError, RemoteSystemProbe};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DaemonState {
    Running,
    Stopped,
    Dead,
}

struct Unit {
    name: &'static str,
    load: &'static str,
    active: &'static str,
    sub: &'static str,
}

struct NodeState {
    cores: u32,
    pinnable_cores: u32,
    next_pid: u32,
    load_pids: BTreeSet<u32>,
    daemons: BTreeMap<String, DaemonState>,
    units: Vec<Unit>,
    restarted: Vec<String>,
    mem_free_kb: u64,
    cpu_ticks: (u64, u64),
    commands: Vec<String>,
}

#[derive(Clone)]
struct FakeNode {
    state: Arc<Mutex<NodeState>>,
}

impl FakeNode {
    fn new(cores: u32) -> Self {
        let daemons = ["ntpd", "lldpd"]
            .iter()
            .map(|n| (n.to_string(), DaemonState::Running))
            .collect();
        let units = vec![
            Unit { name: "cron.service", load: "loaded", active: "failed", sub: "failed" },
            Unit { name: "ssh.service", load: "loaded", active: "active", sub: "running" },
            Unit { name: "tmp.mount", load: "loaded", active: "active", sub: "mounted" },
            Unit { name: "nfs.service", load: "not-found", active: "inactive", sub: "dead" },
        ];

        Self {
            state: Arc::new(Mutex::new(NodeState {
                cores,
                pinnable_cores: cores,
                next_pid: 5000,
                load_pids: BTreeSet::new(),
                daemons,
                units,
                restarted: Vec::new(),
                mem_free_kb: 600_000,
                cpu_ticks: (0, 0),
                commands: Vec::new(),
            })),
        }
    }

    /// cpuinfo keeps listing `cores`, but affinity to core >= `pinnable` is refused
    fn with_pinnable_cores(self, pinnable: u32) -> Self {
        self.state.lock().unwrap().pinnable_cores = pinnable;
        self
    }

    fn leak(&self, kb: u64) {
        self.state.lock().unwrap().mem_free_kb -= kb;
    }

    fn load_pids(&self) -> BTreeSet<u32> {
        self.state.lock().unwrap().load_pids.clone()
    }

    fn daemon(&self, name: &str) -> DaemonState {
        self.state.lock().unwrap().daemons[name]
    }

    fn restarted(&self) -> Vec<String> {
        self.state.lock().unwrap().restarted.clone()
    }

    fn commands(&self) -> Vec<String> {
        self.state.lock().unwrap().commands.clone()
    }
}

fn failure(output: impl Into<String>) -> ExecutionError {
    ExecutionError::NonZeroExit {
        code: Some(1),
        output: output.into(),
    }
}

impl NodeState {
    fn list_units(&self, state: Option<&str>) -> String {
        let rows: Vec<String> = self
            .units
            .iter()
            .filter(|u| state.map_or(true, |s| [u.load, u.active, u.sub].contains(&s)))
            .map(|u| {
                let marker = if u.active == "failed" { "●" } else { " " };
                format!("{marker} {:<16} {:<9} {:<8} {:<8} {} unit", u.name, u.load, u.active, u.sub, u.name)
            })
            .collect();

        let mut out = String::from("  UNIT             LOAD      ACTIVE   SUB      DESCRIPTION\n");
        for row in &rows {
            out.push_str(row);
            out.push('\n');
        }
        out.push_str(&format!(
            "\nLOAD   = Reflects whether the unit definition was properly loaded.\n\
             ACTIVE = The high-level unit activation state, i.e. generalization of SUB.\n\
             SUB    = The low-level unit activation state, values depend on unit type.\n\
             \n{} loaded units listed.\n\
             To show all installed unit files use 'systemctl list-unit-files'.\n",
            rows.len()
        ));
        out
    }

    fn handle(&mut self, command: &str) -> Result<String, ExecutionError> {
        if command == "cat /proc/cpuinfo" {
            return Ok((0..self.cores)
                .map(|i| format!("processor\t: {i}\nmodel name\t: Fake CPU\n\n"))
                .collect());
        }
        if command == "cat /proc/meminfo" {
            return Ok(format!(
                "MemTotal:        1000000 kB\nMemFree:         {} kB\nCached:           200000 kB\nSwapCached:          512 kB\n",
                self.mem_free_kb
            ));
        }
        if command == "cat /proc/stat" {
            // 30% busy between consecutive reads
            self.cpu_ticks.0 += 30;
            self.cpu_ticks.1 += 70;
            return Ok(format!(
                "cpu  {} 0 0 {} 0 0 0 0 0 0\ncpu0 1 1 1 1 0 0 0 0 0 0\n",
                self.cpu_ticks.0, self.cpu_ticks.1
            ));
        }
        if let Some(rest) = command.strip_prefix("if taskset --cpu-list ") {
            let core: u32 = rest
                .split_whitespace()
                .next()
                .and_then(|c| c.parse().ok())
                .ok_or_else(|| failure("taskset: bad cpu list"))?;
            if core >= self.pinnable_cores {
                // the pre-check prints taskset's error, then the else branch runs
                return Ok(format!(
                    "taskset: failed to set pid 0's affinity: Invalid argument\n\
                     failed to pin load to core {core}\n"
                ));
            }
            let pid = self.next_pid;
            self.next_pid += 1;
            self.load_pids.insert(pid);
            return Ok(format!("{pid}\n"));
        }
        if let Some(pid) = command.strip_prefix("kill -9 ") {
            let pid: u32 = pid.trim().parse().map_err(|_| failure("kill: bad pid"))?;
            return if self.load_pids.remove(&pid) {
                Ok(String::new())
            } else {
                Err(failure(format!("kill: ({pid}) - No such process")))
            };
        }
        if let Some(rest) = command.strip_prefix("killall -") {
            let (signal, name) = rest.split_once(' ').ok_or_else(|| failure("killall: usage"))?;
            let next = match signal {
                "TERM" => DaemonState::Dead,
                "STOP" => DaemonState::Stopped,
                "CONT" => DaemonState::Running,
                _ => return Err(failure("killall: unknown signal")),
            };
            return match self.daemons.get_mut(name) {
                Some(state) if *state != DaemonState::Dead => {
                    *state = next;
                    Ok(String::new())
                }
                _ => Err(failure(format!("{name}: no process found"))),
            };
        }
        if let Some(name) = command.strip_prefix("systemctl restart ") {
            return match self.units.iter_mut().find(|u| u.name == name) {
                Some(unit) if unit.load == "loaded" => {
                    unit.active = "active";
                    unit.sub = "running";
                    self.restarted.push(name.to_string());
                    Ok(String::new())
                }
                _ => Err(ExecutionError::NonZeroExit {
                    code: Some(5),
                    output: format!("Failed to restart {name}: Unit {name} not found.\n"),
                }),
            };
        }
        if let Some(rest) = command.strip_prefix("systemctl list-units --all") {
            let state = rest.trim().strip_prefix("--state=");
            return Ok(self.list_units(state));
        }
        if command.starts_with("sed -i ") {
            return Ok(String::new());
        }
        Err(ExecutionError::SpawnFailed(format!("unexpected command: {command}")))
    }
}

#[async_trait]
impl RemoteExecutor for FakeNode {
    async fn execute(&self, command: &str, shell: Shell) -> Result<String, ExecutionError> {
        assert_eq!(shell, Shell::Bash);
        let mut state = self.state.lock().unwrap();
        state.commands.push(command.to_string());
        state.handle(command)
    }
}

fn probe(node: &FakeNode) -> RemoteSystemProbe {
    RemoteSystemProbe::with_config(
        Arc::new(node.clone()),
        ProbeConfig::default().with_cpu_sample_window(Duration::from_millis(1)),
    )
}

#[tokio::test]
async fn test_cpu_load_lifecycle() {
    let node = FakeNode::new(4);
    let probe = probe(&node);

    let handles = probe.generate_cpu_load().await.unwrap();
    assert_eq!(handles.len(), 4);
    assert_eq!(node.load_pids().len(), 4);

    let cores: Vec<Option<u32>> = handles.iter().map(|h| h.core()).collect();
    assert_eq!(cores, vec![Some(0), Some(1), Some(2), Some(3)]);

    probe.stop_cpu_load(handles).await.unwrap();
    assert!(node.load_pids().is_empty(), "all load processes should be gone");
}

#[tokio::test]
async fn test_cpu_load_unpinnable_core_fails_and_cleans_up() {
    let node = FakeNode::new(4).with_pinnable_cores(2);
    let probe = probe(&node);

    let result = probe.generate_cpu_load().await;

    assert!(matches!(result, Err(ProbeError::OperationFailed(_))));
    // processes on cores 0 and 1 were killed again
    assert!(node.load_pids().is_empty());
    let spawns = node
        .commands()
        .iter()
        .filter(|c| c.starts_with("if taskset"))
        .count();
    assert_eq!(spawns, 3);
}

#[tokio::test]
async fn test_daemon_halt_resume_kill() {
    let node = FakeNode::new(1);
    let probe = probe(&node);

    probe.halt_daemons(&["ntpd", "lldpd"]).await.unwrap();
    assert_eq!(node.daemon("ntpd"), DaemonState::Stopped);
    assert_eq!(node.daemon("lldpd"), DaemonState::Stopped);

    probe.resume_daemons(&["ntpd"]).await.unwrap();
    assert_eq!(node.daemon("ntpd"), DaemonState::Running);

    probe.kill_daemons(&["ntpd"]).await.unwrap();
    assert_eq!(node.daemon("ntpd"), DaemonState::Dead);

    // a second kill finds nothing to signal
    let result = probe.kill_daemons(&["ntpd"]).await;
    assert!(matches!(result, Err(ProbeError::OperationFailed(_))));
}

#[tokio::test]
async fn test_kill_daemons_unknown_name_stops_the_batch() {
    let node = FakeNode::new(1);
    let probe = probe(&node);

    let result = probe.kill_daemons(&["ghost", "ntpd"]).await;

    assert!(matches!(result, Err(ProbeError::OperationFailed(_))));
    assert_eq!(node.daemon("ntpd"), DaemonState::Running);
}

#[tokio::test]
async fn test_restart_is_sequential_not_atomic() {
    let node = FakeNode::new(1);
    let probe = probe(&node);

    let result = probe
        .reload_service_units(&["ssh.service", "nfs.service", "cron.service"])
        .await;

    assert!(matches!(result, Err(ProbeError::OperationFailed(msg)) if msg.contains("nfs.service")));
    assert_eq!(node.restarted(), vec!["ssh.service"]);
}

#[tokio::test]
async fn test_restart_clears_failed_service() {
    let node = FakeNode::new(1);
    let probe = probe(&node);

    let failed = probe.list_failed_services().await.unwrap();
    assert_eq!(failed, Some(vec!["cron.service".to_string()]));

    assert!(probe.reload_service_units(&["cron.service"]).await.unwrap());

    assert_eq!(probe.list_failed_services().await.unwrap(), None);
}

#[tokio::test]
async fn test_unit_listings() {
    let node = FakeNode::new(1);
    let probe = probe(&node);

    let all = probe.list_all_units().await.unwrap().unwrap();
    assert_eq!(all, vec!["cron.service", "ssh.service", "tmp.mount", "nfs.service"]);

    let loaded = probe.list_loaded_units().await.unwrap().unwrap();
    assert_eq!(loaded, vec!["cron.service", "ssh.service", "tmp.mount"]);

    let running = probe
        .list_units(Some(&UnitState::other("running").unwrap()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(running.len(), 1);
    assert_eq!(running[0].name, "ssh.service");

    let commands = node.commands();
    assert!(commands.contains(&"systemctl list-units --all".to_string()));
    assert!(commands.contains(&"systemctl list-units --all --state=loaded".to_string()));
}

#[tokio::test]
async fn test_memory_leak_workflow() {
    let node = FakeNode::new(1);
    let probe = probe(&node);

    let initial = probe.read_memory_sample().await.unwrap();
    assert_eq!(initial.mem_total_kb, 1_000_000);
    assert_eq!(initial.cached_kb, 200_000);

    let steady = probe.read_memory_sample().await.unwrap();
    assert!(!RemoteSystemProbe::detect_memory_leak(&initial, &steady, 1024).unwrap());

    node.leak(4096);
    let leaked = probe.read_memory_sample().await.unwrap();
    assert!(RemoteSystemProbe::detect_memory_leak(&initial, &leaked, 1024).unwrap());
    assert!(!RemoteSystemProbe::detect_memory_leak(&initial, &leaked, 8192).unwrap());
}

#[tokio::test]
async fn test_cpu_usage_from_two_reads() {
    let node = FakeNode::new(2);
    let probe = probe(&node);

    let usage = probe.read_cpu_usage().await.unwrap();
    assert!((usage - 0.3).abs() < 1e-9, "usage was {usage}");
}

#[tokio::test]
async fn test_ssh_client_mode_targets_configured_file() {
    let node = FakeNode::new(1);
    let probe = RemoteSystemProbe::with_config(
        Arc::new(node.clone()),
        ProbeConfig::default().with_ssh_config_path("/etc/ssh/ssh_config.d/probe.conf"),
    );

    probe.enable_ssh_client_mode().await.unwrap();

    let commands = node.commands();
    assert_eq!(commands.len(), 1);
    assert!(commands[0].ends_with("/etc/ssh/ssh_config.d/probe.conf"));
}
