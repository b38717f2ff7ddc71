//! Feature modules implementing the cashback API
//!
//! Each feature is a vertical slice with its own commands and routes:
//! - `commands/` - write operations
//! - `routes.rs` - HTTP route definitions
//!
//! # Features
//!
//! - **upload**: ingest an uploaded export file into the month/year schema

pub mod upload;

use axum::Router;
use cashback_ingest::{DatabaseConfig, PipelineConfig};

/// Shared state for all feature routes
///
/// Uploads open their own connection pool, so the state carries the pool
/// settings rather than a pool.
#[derive(Debug, Clone)]
pub struct FeatureState {
    pub database: DatabaseConfig,
    pub pipeline: PipelineConfig,
}

/// Creates the router with all feature routes mounted
pub fn router(state: FeatureState) -> Router<()> {
    Router::new().merge(upload::upload_routes().with_state(state))
}
