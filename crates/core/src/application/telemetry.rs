// Memory & CPU telemetry
use tracing::info;

use super::RemoteSystemProbe;
use crate::domain::command;
use crate::domain::cpu::{self, CpuTimes};
use crate::domain::memory::{self, MemorySample};
use crate::error::Result;

impl RemoteSystemProbe {
    /// MemTotal, MemFree and Cached from /proc/meminfo
    pub async fn read_memory_sample(&self) -> Result<MemorySample> {
        let output = self.run(command::READ_MEMINFO).await?;
        let sample = MemorySample::parse(&output)?;

        info!(
            mem_total_kb = sample.mem_total_kb,
            mem_free_kb = sample.mem_free_kb,
            cached_kb = sample.cached_kb,
            "Memory sample collected"
        );
        Ok(sample)
    }

    /// Compare used memory of two samples against `threshold_kb`
    pub fn detect_memory_leak(
        initial: &MemorySample,
        last: &MemorySample,
        threshold_kb: u64,
    ) -> Result<bool> {
        let leak = memory::detect_leak(initial, last, threshold_kb)?;
        info!(
            initial_used_kb = initial.used_kb(),
            final_used_kb = last.used_kb(),
            threshold_kb,
            leak,
            "Memory leak check completed"
        );
        Ok(leak)
    }

    /// Aggregate jiffies from /proc/stat
    pub async fn read_cpu_times(&self) -> Result<CpuTimes> {
        let output = self.run(command::READ_STAT).await?;
        CpuTimes::parse(&output)
    }

    /// Busy fraction in [0, 1] over the configured sampling window
    pub async fn read_cpu_usage(&self) -> Result<f64> {
        let before = self.read_cpu_times().await?;
        tokio::time::sleep(self.config.cpu_sample_window).await;
        let after = self.read_cpu_times().await?;

        let usage = cpu::busy_fraction(&before, &after);
        info!(
            usage = %usage,
            window = ?self.config.cpu_sample_window,
            "CPU usage sampled"
        );
        Ok(usage)
    }
}
