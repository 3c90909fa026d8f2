//! Error types for Concord.

use thiserror::Error;

/// Result type for Concord operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Concord operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Name or channel already bound
    #[error("Already exists: {0}")]
    Duplicate(String),

    /// Name is not path-safe
    #[error("Invalid name: {0:?}")]
    InvalidName(String),

    /// Project, file, line or proposal lookup miss
    #[error("Not found: {0}")]
    NotFound(String),

    /// Proposal does not fit its target
    #[error("Invalid proposal: {0}")]
    InvalidProposal(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Duplicate(_) => "duplicate",
            Error::InvalidName(_) => "invalid_name",
            Error::NotFound(_) => "not_found",
            Error::InvalidProposal(_) => "invalid_proposal",
            Error::Storage(_) | Error::Serialization(_) | Error::Io(_) => "storage",
        }
    }
}

impl From<tempfile::PersistError> for Error {
    fn from(e: tempfile::PersistError) -> Self {
        Error::Storage(e.to_string())
    }
}
