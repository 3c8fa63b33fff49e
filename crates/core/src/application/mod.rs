// Application Layer - Probe operations

pub mod constants;
mod daemons;
mod host;
mod load;
mod probe;
mod telemetry;
mod units;

// Re-exports
pub use probe::RemoteSystemProbe;
