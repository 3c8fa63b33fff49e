// /proc/stat and /proc/cpuinfo parsing

use serde::Serialize;

use crate::error::{ProbeError, Result};

/// Aggregate CPU jiffies from the first line of /proc/stat
///
/// Format: `cpu user nice system idle iowait irq softirq ...`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CpuTimes {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
}

impl CpuTimes {
    pub fn parse(output: &str) -> Result<Self> {
        let line = output.lines().next().unwrap_or_default();
        let tokens: Vec<&str> = line.split_whitespace().collect();

        if tokens.first() != Some(&"cpu") {
            return Err(ProbeError::parse(format!(
                "first /proc/stat line is not the cpu aggregate: {line:?}"
            )));
        }
        if tokens.len() < 5 {
            return Err(ProbeError::parse(format!(
                "cpu line has {} fields, expected at least 5",
                tokens.len()
            )));
        }

        let field = |i: usize| {
            tokens[i].parse::<u64>().map_err(|e| {
                ProbeError::parse(format!("invalid cpu counter {:?}: {e}", tokens[i]))
            })
        };

        Ok(Self {
            user: field(1)?,
            nice: field(2)?,
            system: field(3)?,
            idle: field(4)?,
        })
    }

    /// user + nice + system
    pub fn work(&self) -> u64 {
        self.user
            .saturating_add(self.nice)
            .saturating_add(self.system)
    }
}

/// Fraction of the window spent busy, always within [0, 1]
///
/// Counters that went backwards count as zero; an empty window is 0.0.
pub fn busy_fraction(before: &CpuTimes, after: &CpuTimes) -> f64 {
    let work = after.work().saturating_sub(before.work());
    let idle = after.idle.saturating_sub(before.idle);
    let total = work.saturating_add(idle);

    if total == 0 {
        return 0.0;
    }
    (work as f64 / total as f64).clamp(0.0, 1.0)
}

/// Number of `processor` entries in /proc/cpuinfo
pub fn count_processors(output: &str) -> Result<u32> {
    let count = output
        .lines()
        .filter(|line| line.split(':').next().map(str::trim) == Some("processor"))
        .count();

    if count == 0 {
        return Err(ProbeError::parse("no processor entries in /proc/cpuinfo"));
    }
    u32::try_from(count).map_err(|_| ProbeError::parse(format!("implausible core count {count}")))
}
