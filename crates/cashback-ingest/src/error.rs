//! Error types for the ingestion core
//!
//! Only resource-level failures surface as [`IngestError`]. Field parse
//! failures and failed inserts are logged and counted instead.

use thiserror::Error;

/// Result type alias for ingestion operations
pub type IngestResult<T> = std::result::Result<T, IngestError>;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv_async::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid date parameters: {0}")]
    InvalidDate(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Failure of a single insert attempt
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("failed to acquire connection: {0}")]
    Acquire(#[source] sqlx::Error),

    #[error("insert failed: {0}")]
    Insert(#[source] sqlx::Error),
}
