// Central Error Type for probe operations

use thiserror::Error;

use crate::port::ExecutionError;

/// Probe-level error type
///
/// Every operation surfaces failures through one of these variants; nothing
/// is retried or defaulted silently.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// Empty or malformed caller input, rejected before any remote command
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Expected marker absent from remote output
    #[error("Parse error: {0}")]
    Parse(String),

    /// Remote command reported failure through its own text convention
    #[error("Operation failed: {0}")]
    OperationFailed(String),

    #[error("Transport error: {0}")]
    Transport(#[from] ExecutionError),
}

impl ProbeError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        ProbeError::InvalidArgument(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        ProbeError::Parse(msg.into())
    }

    pub fn operation_failed(msg: impl Into<String>) -> Self {
        ProbeError::OperationFailed(msg.into())
    }
}

/// Result type alias using ProbeError
pub type Result<T> = std::result::Result<T, ProbeError>;
