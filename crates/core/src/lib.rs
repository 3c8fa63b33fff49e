// NodeProbe Core - Domain Logic & Ports
// NO transport dependencies: executors live in nodeprobe-infra-system

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod port;

pub use application::RemoteSystemProbe;
pub use config::ProbeConfig;
pub use error::{ProbeError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
