// Domain Layer - Parsers, identifiers and command construction

pub mod command;
pub mod cpu;
pub mod identifier;
pub mod memory;
pub mod process;
pub mod unit;

// Re-exports
pub use cpu::CpuTimes;
pub use identifier::{DaemonName, ServiceName};
pub use memory::MemorySample;
pub use process::{DaemonSignal, LoadProcess};
pub use unit::{ServiceUnit, UnitState};
