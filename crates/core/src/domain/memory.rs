// /proc/meminfo sample and leak detection

use serde::Serialize;

use crate::error::{ProbeError, Result};

/// Memory counters in kB, read from /proc/meminfo
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MemorySample {
    pub mem_total_kb: u64,
    pub mem_free_kb: u64,
    pub cached_kb: u64,
}

impl MemorySample {
    pub fn new(mem_total_kb: u64, mem_free_kb: u64, cached_kb: u64) -> Self {
        Self {
            mem_total_kb,
            mem_free_kb,
            cached_kb,
        }
    }

    /// Parse /proc/meminfo text
    ///
    /// Values are the token after the exact `MemTotal:`, `MemFree:` and
    /// `Cached:` labels; the `kB` suffix is ignored.
    pub fn parse(output: &str) -> Result<Self> {
        if !output.contains("MemTotal") {
            return Err(ProbeError::parse("MemTotal not found in /proc/meminfo"));
        }

        let mut total = None;
        let mut free = None;
        let mut cached = None;

        for line in output.lines() {
            let mut tokens = line.split_whitespace();
            let slot = match tokens.next() {
                Some("MemTotal:") => &mut total,
                Some("MemFree:") => &mut free,
                Some("Cached:") => &mut cached,
                _ => continue,
            };
            let value = tokens.next().ok_or_else(|| {
                ProbeError::parse(format!("missing value in meminfo line: {line:?}"))
            })?;
            let kb = value.parse::<u64>().map_err(|e| {
                ProbeError::parse(format!("invalid meminfo value {value:?}: {e}"))
            })?;
            *slot = Some(kb);
        }

        let require = |v: Option<u64>, label: &str| {
            v.ok_or_else(|| ProbeError::parse(format!("{label} not found in /proc/meminfo")))
        };

        Ok(Self {
            mem_total_kb: require(total, "MemTotal")?,
            mem_free_kb: require(free, "MemFree")?,
            cached_kb: require(cached, "Cached")?,
        })
    }

    /// total - (free + cached), floored at zero
    pub fn used_kb(&self) -> u64 {
        self.mem_total_kb
            .saturating_sub(self.mem_free_kb.saturating_add(self.cached_kb))
    }

    fn ensure_present(&self, which: &str) -> Result<()> {
        if self.mem_total_kb == 0 {
            return Err(ProbeError::invalid_argument(format!(
                "{which} memory sample is empty"
            )));
        }
        Ok(())
    }
}

/// True when used memory moved by more than `threshold_kb` between samples
pub fn detect_leak(initial: &MemorySample, last: &MemorySample, threshold_kb: u64) -> Result<bool> {
    initial.ensure_present("initial")?;
    last.ensure_present("final")?;

    Ok(initial.used_kb().abs_diff(last.used_kb()) > threshold_kb)
}
