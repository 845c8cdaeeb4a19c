//! Error types for biometric operations
//!
//! Authentication outcomes are never errors; see [`crate::models::AuthOutcome`].
//! These cover the infrastructure around the adapter: probing the host,
//! reading configuration, talking to helper processes.

use thiserror::Error;

/// Errors that can occur around biometric authentication
#[derive(Error, Debug)]
pub enum BiometricError {
    #[error("Biometric subsystem could not be queried: {0}")]
    ProbeFailed(String),

    #[error("Biometric service not supported on this platform: {0}")]
    Unsupported(String),

    #[error("Helper process failed: {0}")]
    ProcessError(String),

    #[error("Unknown result code: {0}")]
    UnknownCode(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type BiometricResult<T> = Result<T, BiometricError>;
