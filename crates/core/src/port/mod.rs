// Port Layer - Interfaces for external dependencies

pub mod remote_executor;

// Re-exports
pub use remote_executor::{mocks, ExecutionError, RemoteExecutor, Shell};
