//! Cashback Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared error handling and logging for the cashback ingestion workspace.
//!
//! # Overview
//!
//! - **Error Handling**: [`CashbackError`] and the [`Result`] alias
//! - **Logging**: centralized `tracing` setup with console and append-only
//!   file output, see [`logging`]
//!
//! # Example
//!
//! ```no_run
//! use cashback_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = LogConfig::from_env()?;
//!     init_logging(&config)?;
//!     tracing::info!("Application started");
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{CashbackError, Result};
