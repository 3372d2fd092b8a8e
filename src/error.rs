//! Error types for mailbox ingestion

use thiserror::Error;

/// Main error type for ingestion operations
#[derive(Error, Debug)]
pub enum IngestError {
    /// A PST container could not be opened or a folder/message inside it could not be read
    #[error("PST error: {0}")]
    Pst(String),

    /// An MSG container could not be opened or parsed
    #[error("MSG error: {0}")]
    Msg(String),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Path-related error
    #[error("Path error: {0}")]
    Path(String),
}

/// Result type alias for ingestion operations
pub type Result<T> = std::result::Result<T, IngestError>;

impl From<outlook_pst::PstError> for IngestError {
    fn from(err: outlook_pst::PstError) -> Self {
        Self::Pst(err.to_string())
    }
}
