// NodeProbe Infrastructure - Executor Adapters
// Implements: RemoteExecutor over a local shell and over ssh

pub mod local_shell_executor;
pub mod ssh_executor;

pub use local_shell_executor::{LocalShellConfig, LocalShellExecutor};
pub use ssh_executor::{SshExecutor, SshTarget};
