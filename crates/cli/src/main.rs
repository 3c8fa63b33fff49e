//! NodeProbe CLI - inspect and perturb services and resources of a Linux node
//! Runs locally, or on a remote node through the ssh client when --host is set

mod logging;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde_json::json;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use nodeprobe_core::domain::{LoadProcess, UnitState};
use nodeprobe_core::port::RemoteExecutor;
use nodeprobe_core::{ProbeConfig, RemoteSystemProbe};
use nodeprobe_infra_system::{LocalShellConfig, LocalShellExecutor, SshExecutor, SshTarget};

use output::{print_json, table, LoadRow, MemoryRow, UnitRow};

const DEFAULT_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_SAMPLE_WINDOW_MS: u64 = 5;

#[derive(Parser)]
#[command(name = "nodeprobe")]
#[command(about = "Inspect and perturb system services and resources of a Linux node", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Remote node reached with ssh (runs locally when omitted)
    #[arg(long, env = "NODEPROBE_HOST", global = true)]
    host: Option<String>,

    /// ssh login user
    #[arg(long, env = "NODEPROBE_USER", global = true)]
    user: Option<String>,

    /// ssh port
    #[arg(long, env = "NODEPROBE_PORT", global = true)]
    port: Option<u16>,

    /// ssh identity file (~ is expanded)
    #[arg(long, env = "NODEPROBE_IDENTITY", global = true)]
    identity: Option<String>,

    /// Per-command deadline in milliseconds (0 disables it)
    #[arg(long, env = "NODEPROBE_TIMEOUT_MS", default_value_t = DEFAULT_TIMEOUT_MS, global = true)]
    timeout_ms: u64,

    /// Delay between the two /proc/stat reads of a CPU sample
    #[arg(long, env = "NODEPROBE_SAMPLE_WINDOW_MS", default_value_t = DEFAULT_SAMPLE_WINDOW_MS, global = true)]
    sample_window_ms: u64,

    /// Shell command pinned to each core by `load`
    #[arg(long, env = "NODEPROBE_LOAD_PROGRAM", global = true)]
    load_program: Option<String>,

    /// ssh client configuration edited by `ssh-client-mode`
    #[arg(long, env = "NODEPROBE_SSH_CONFIG", global = true)]
    ssh_config: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List failed service units (exit status 1 when any failed)
    FailedServices,

    /// List units, optionally filtered by state
    Units {
        /// State filter (failed, loaded, active, inactive, running, ...)
        #[arg(short, long)]
        state: Option<String>,

        /// Print unit names only
        #[arg(long)]
        names_only: bool,
    },

    /// Restart service units in order, stopping at the first failure
    Restart {
        #[arg(required = true)]
        services: Vec<String>,
    },

    /// Read MemTotal, MemFree and Cached
    Memory,

    /// Sample memory twice and report a leak (exit status 1 on leak)
    LeakCheck {
        /// Allowed change of used memory between samples
        #[arg(long, default_value_t = 1024)]
        threshold_kb: u64,

        /// Time between the two samples
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,
    },

    /// Sample CPU busy fraction
    Cpu,

    /// Pin a busy loop on every core, then stop it
    Load {
        /// How long to keep the load (Ctrl+C stops early)
        #[arg(long, default_value_t = 10)]
        duration_secs: u64,

        /// Leave the processes running and print their pids
        #[arg(long)]
        detach: bool,
    },

    /// Kill load processes started with `load --detach`
    Unload {
        #[arg(required = true)]
        pids: Vec<u32>,
    },

    /// Signal daemons by name
    Daemons {
        #[command(subcommand)]
        action: DaemonAction,
    },

    /// Disable host key prompts in the node's ssh client configuration
    SshClientMode,
}

#[derive(Subcommand)]
enum DaemonAction {
    /// SIGTERM
    Kill {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// SIGSTOP
    Halt {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// SIGCONT
    Resume {
        #[arg(required = true)]
        names: Vec<String>,
    },
}

impl Cli {
    fn command_timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }

    fn executor(&self) -> Result<Arc<dyn RemoteExecutor>> {
        Ok(match &self.host {
            Some(host) => {
                let mut target = SshTarget::new(host.clone());
                if let Some(user) = &self.user {
                    target = target.with_user(user.clone());
                }
                if let Some(port) = self.port {
                    target = target.with_port(port);
                }
                if let Some(identity) = &self.identity {
                    target = target.with_identity_file(identity);
                }
                target.validate().context("Invalid ssh target")?;
                Arc::new(SshExecutor::new(target).with_timeout(self.command_timeout()))
            }
            None => Arc::new(LocalShellExecutor::new(LocalShellConfig {
                timeout: self.command_timeout(),
                ..Default::default()
            })),
        })
    }

    fn probe_config(&self) -> ProbeConfig {
        let mut config = ProbeConfig::default()
            .with_cpu_sample_window(Duration::from_millis(self.sample_window_ms));
        if let Some(program) = &self.load_program {
            config = config.with_load_program(program.clone());
        }
        if let Some(path) = &self.ssh_config {
            config = config.with_ssh_config_path(path.clone());
        }
        config
    }
}

/// Apply a daemon action, returning the names and the past-tense verb
async fn signal_daemons<'a>(
    probe: &RemoteSystemProbe,
    action: &'a DaemonAction,
) -> Result<(&'a Vec<String>, &'static str)> {
    let (names, verb, result) = match action {
        DaemonAction::Kill { names } => (names, "Killed", probe.kill_daemons(names).await),
        DaemonAction::Halt { names } => (names, "Halted", probe.halt_daemons(names).await),
        DaemonAction::Resume { names } => (names, "Resumed", probe.resume_daemons(names).await),
    };
    result.context("Failed to signal daemons")?;
    Ok((names, verb))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose)?;

    let probe = RemoteSystemProbe::with_config(cli.executor()?, cli.probe_config());
    info!(
        host = cli.host.as_deref().unwrap_or("localhost"),
        version = nodeprobe_core::VERSION,
        "NodeProbe starting"
    );

    match &cli.command {
        Commands::FailedServices => {
            let failed = probe
                .list_failed_services()
                .await
                .context("Failed to list failed services")?;

            if cli.json {
                print_json(&failed)?;
            } else {
                match &failed {
                    None => println!("{}", "✓ No failed services".green().bold()),
                    Some(names) => {
                        println!("{}", format!("✗ {} failed service(s)", names.len()).red().bold());
                        for name in names {
                            println!("  {} {}", "•".bold(), name);
                        }
                    }
                }
            }
            if failed.is_some() {
                return Ok(ExitCode::from(1));
            }
        }

        Commands::Units { state, names_only } => {
            let state = state.as_deref().map(UnitState::other).transpose()?;
            let units = probe
                .list_units(state.as_ref())
                .await
                .context("Failed to list units")?
                .unwrap_or_default();

            if cli.json {
                if *names_only {
                    let names: Vec<&str> = units.iter().map(|u| u.name.as_str()).collect();
                    print_json(&names)?;
                } else {
                    print_json(&units)?;
                }
            } else if units.is_empty() {
                println!("{}", "No units listed".yellow());
            } else if *names_only {
                for unit in &units {
                    println!("{}", unit.name);
                }
            } else {
                println!("{}", table::<_, UnitRow, _>(&units));
            }
        }

        Commands::Restart { services } => {
            probe
                .reload_service_units(services)
                .await
                .context("Service restart failed")?;

            if cli.json {
                print_json(&json!({ "restarted": services }))?;
            } else {
                for service in services {
                    println!("{} {}", "✓ Restarted".green().bold(), service);
                }
            }
        }

        Commands::Memory => {
            let sample = probe.read_memory_sample().await.context("Failed to read memory")?;

            if cli.json {
                print_json(&json!({
                    "mem_total_kb": sample.mem_total_kb,
                    "mem_free_kb": sample.mem_free_kb,
                    "cached_kb": sample.cached_kb,
                    "used_kb": sample.used_kb(),
                }))?;
            } else {
                println!("{}", table::<_, MemoryRow, _>([&sample]));
            }
        }

        Commands::LeakCheck {
            threshold_kb,
            interval_ms,
        } => {
            let initial = probe.read_memory_sample().await.context("Failed to read memory")?;
            tokio::time::sleep(Duration::from_millis(*interval_ms)).await;
            let last = probe.read_memory_sample().await.context("Failed to read memory")?;

            let leak = RemoteSystemProbe::detect_memory_leak(&initial, &last, *threshold_kb)?;

            if cli.json {
                print_json(&json!({
                    "initial_used_kb": initial.used_kb(),
                    "final_used_kb": last.used_kb(),
                    "threshold_kb": threshold_kb,
                    "leak": leak,
                }))?;
            } else {
                println!("  {} {} kB", "Initial used:".bold(), initial.used_kb());
                println!("  {} {} kB", "Final used:".bold(), last.used_kb());
                println!("  {} {} kB", "Threshold:".bold(), threshold_kb);
                if leak {
                    println!("{}", "✗ Memory leak detected".red().bold());
                } else {
                    println!("{}", "✓ No memory leak".green().bold());
                }
            }
            if leak {
                return Ok(ExitCode::from(1));
            }
        }

        Commands::Cpu => {
            let usage = probe.read_cpu_usage().await.context("Failed to sample CPU")?;

            if cli.json {
                print_json(&json!({ "busy_fraction": usage }))?;
            } else {
                println!("  {} {:.1}%", "CPU busy:".bold(), usage * 100.0);
            }
        }

        Commands::Load {
            duration_secs,
            detach,
        } => {
            let handles = probe.generate_cpu_load().await.context("Failed to start CPU load")?;

            if cli.json {
                print_json(&handles)?;
            } else {
                println!("{}", "✓ CPU load started".green().bold());
                println!("{}", table::<_, LoadRow, _>(&handles));
            }

            if *detach {
                let pids: Vec<u32> = handles.into_iter().map(LoadProcess::detach).collect();
                info!(?pids, "Load processes detached");
                return Ok(ExitCode::SUCCESS);
            }

            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(*duration_secs)) => {}
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupted, stopping load early");
                }
            }

            probe.stop_cpu_load(handles).await.context("Failed to stop CPU load")?;
            if !cli.json {
                println!("{}", "✓ CPU load stopped".green().bold());
            }
        }

        Commands::Unload { pids } => {
            let handles = pids.iter().copied().map(LoadProcess::adopt).collect();
            probe.stop_cpu_load(handles).await.context("Failed to stop CPU load")?;

            if !cli.json {
                println!("{}", format!("✓ Signalled {} process(es)", pids.len()).green().bold());
            }
        }

        Commands::Daemons { action } => {
            let (names, verb) = signal_daemons(&probe, action).await?;

            if cli.json {
                print_json(&json!({ "action": verb.to_lowercase(), "daemons": names }))?;
            } else {
                for name in names {
                    println!("{} {}", format!("✓ {verb}").green().bold(), name);
                }
            }
        }

        Commands::SshClientMode => {
            probe
                .enable_ssh_client_mode()
                .await
                .context("Failed to edit ssh client configuration")?;

            if !cli.json {
                println!(
                    "{} {}",
                    "✓ SSH client mode enabled in".green().bold(),
                    probe.config().ssh_config_path
                );
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
