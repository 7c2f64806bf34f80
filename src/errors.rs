use thiserror::Error;

/// Failures raised by the collaborators the engine reads from and writes to.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// Domain-level error surfaced by the public report operations.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Report generation failed: {0}")]
    ReportGenerationFailed(String),
    #[error("Carryover lookup failed: {0}")]
    CarryoverLookupFailed(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ReportError>;

impl ReportError {
    pub(crate) fn generation(err: impl std::fmt::Display) -> Self {
        ReportError::ReportGenerationFailed(err.to_string())
    }

    pub(crate) fn carryover(err: impl std::fmt::Display) -> Self {
        ReportError::CarryoverLookupFailed(err.to_string())
    }
}

impl From<crate::config::ConfigError> for ReportError {
    fn from(err: crate::config::ConfigError) -> Self {
        ReportError::Config(err.to_string())
    }
}
