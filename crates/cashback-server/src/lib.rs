//! Cashback Server Library
//!
//! HTTP front end for the cashback ingestion pipeline.
//!
//! # Overview
//!
//! - **Upload endpoint**: `POST /upload?month=..&year=..` with a multipart
//!   `file` field; the file is loaded into `cashback_{month}_{year}.domain`
//! - **Configuration**: environment-based, see [`config::Config`]
//! - **Middleware**: CORS, request tracing, upload size limit
//!
//! Every upload gets its own connection pool, opened after the request has
//! been validated and closed once the ingestion finishes.
//!
//! # Example
//!
//! ```no_run
//! use cashback_server::{api, config::Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     api::serve(config).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod features;
pub mod middleware;

// Re-export commonly used types
pub use error::{ApiResult, AppError};
