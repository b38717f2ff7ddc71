//! Error types shared across the cashback crates

use thiserror::Error;

/// Result type alias for shared operations
pub type Result<T> = std::result::Result<T, CashbackError>;

/// Main error type shared by the workspace
#[derive(Error, Debug)]
pub enum CashbackError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Logging error: {0}")]
    Logging(String),
}
