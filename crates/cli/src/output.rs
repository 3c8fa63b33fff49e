//! Rendering of probe results (tables or JSON)

use anyhow::Result;
use serde::Serialize;
use tabled::{Table, Tabled};

use nodeprobe_core::domain::{LoadProcess, MemorySample, ServiceUnit};

#[derive(Tabled)]
pub struct UnitRow {
    unit: String,
    load: String,
    active: String,
    sub: String,
    description: String,
}

impl From<&ServiceUnit> for UnitRow {
    fn from(unit: &ServiceUnit) -> Self {
        let or_dash = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
        Self {
            unit: unit.name.clone(),
            load: or_dash(&unit.load),
            active: or_dash(&unit.active),
            sub: or_dash(&unit.sub),
            description: or_dash(&unit.description),
        }
    }
}

#[derive(Tabled)]
pub struct MemoryRow {
    #[tabled(rename = "MemTotal (kB)")]
    total: u64,
    #[tabled(rename = "MemFree (kB)")]
    free: u64,
    #[tabled(rename = "Cached (kB)")]
    cached: u64,
    #[tabled(rename = "Used (kB)")]
    used: u64,
}

impl From<&MemorySample> for MemoryRow {
    fn from(sample: &MemorySample) -> Self {
        Self {
            total: sample.mem_total_kb,
            free: sample.mem_free_kb,
            cached: sample.cached_kb,
            used: sample.used_kb(),
        }
    }
}

#[derive(Tabled)]
pub struct LoadRow {
    pid: u32,
    core: String,
}

impl From<&LoadProcess> for LoadRow {
    fn from(process: &LoadProcess) -> Self {
        Self {
            pid: process.pid(),
            core: process
                .core()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "?".to_string()),
        }
    }
}

pub fn table<'a, T, R, I>(items: I) -> String
where
    T: 'a,
    R: Tabled + From<&'a T>,
    I: IntoIterator<Item = &'a T>,
{
    Table::new(items.into_iter().map(R::from)).to_string()
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
