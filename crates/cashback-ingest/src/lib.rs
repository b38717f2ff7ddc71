//! Cashback Ingest Library
//!
//! Normalizes and bulk-loads semicolon-delimited shipment/cashback exports
//! into PostgreSQL.
//!
//! # Pipeline
//!
//! - [`sanitize`]: per-cell text cleanup (encoding artifacts, quotes,
//!   decimal commas, delimiters)
//! - [`reassemble`]: rejoin/re-split of sanitized cells, blank-row end marker
//! - [`mapper`]: positional mapping to a fully populated [`Record`]
//! - [`pipeline`]: sequential reader feeding a bounded queue and a pool of
//!   writer workers, with a [`CompletionTracker`] counting one signal per job
//! - [`storage`]: the [`JobSink`] seam and the PostgreSQL writer
//!
//! # Example
//!
//! ```no_run
//! use cashback_ingest::{
//!     DatabaseConfig, DateContext, IngestPipeline, InsertTarget, PgJobSink, PipelineConfig,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let context = DateContext::new("may", "2023")?;
//!     let pool = DatabaseConfig::from_env()?.open_pool().await?;
//!     let sink = PgJobSink::new(pool, InsertTarget::new(&context));
//!
//!     let input = tokio::fs::read("sample.csv").await?;
//!     let summary = IngestPipeline::new(sink, PipelineConfig::default())?
//!         .run(&input, CancellationToken::new())
//!         .await;
//!
//!     tracing::info!(rows = summary.rows_accepted, "Done in {}s", summary.elapsed_seconds_ceil());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod destination;
pub mod error;
pub mod mapper;
pub mod models;
pub mod pipeline;
pub mod reader;
pub mod reassemble;
pub mod sanitize;
pub mod storage;
pub mod tracker;

// Re-export commonly used types
pub use config::{DatabaseConfig, PipelineConfig};
pub use destination::{DateContext, InsertTarget};
pub use error::{IngestError, IngestResult, SinkError};
pub use models::{IngestJob, Record, SqlValue, COLUMNS};
pub use pipeline::{IngestPipeline, IngestSummary};
pub use storage::{JobSink, PgJobSink};
pub use tracker::{CompletionTicket, CompletionTracker};
