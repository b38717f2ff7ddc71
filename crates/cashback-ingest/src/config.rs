//! Ingestion configuration
//!
//! Pipeline sizing and database pool settings, loaded from the environment
//! with documented defaults.

use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

use crate::error::{IngestError, IngestResult};

// ============================================================================
// Pipeline Defaults
// ============================================================================

/// Default number of writer workers.
pub const DEFAULT_WORKERS: usize = 16;

/// Default interval, in attempted jobs per worker, between progress logs.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 100;

// ============================================================================
// Database Defaults
// ============================================================================

/// Default database URL for local development.
pub const DEFAULT_DATABASE_URL: &str = "postgresql://postgres@localhost/test";

/// Default maximum database connections in the pool.
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 50;

/// Default minimum database connections in the pool.
pub const DEFAULT_DATABASE_MIN_CONNECTIONS: u32 = 4;

/// Default timeout, in seconds, for opening the pool's first connection.
pub const DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default time, in seconds, a writer waits for a free pooled connection.
pub const DEFAULT_DATABASE_ACQUIRE_TIMEOUT_SECS: u64 = 600;

/// Default database idle timeout in seconds (10 minutes).
pub const DEFAULT_DATABASE_IDLE_TIMEOUT_SECS: u64 = 600;

/// Writer pool and queue sizing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Number of concurrent writer workers
    pub workers: usize,
    /// Capacity of the job queue between the reader and the workers
    pub queue_capacity: usize,
    /// Log progress every N jobs attempted by a worker (0 disables)
    pub progress_interval: u64,
    /// Overall deadline for one ingestion (None = no deadline)
    pub request_timeout_secs: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_WORKERS,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            request_timeout_secs: None,
        }
    }
}

impl PipelineConfig {
    /// Load from `INGEST_WORKERS`, `INGEST_QUEUE_CAPACITY`,
    /// `INGEST_PROGRESS_INTERVAL` and `INGEST_REQUEST_TIMEOUT_SECS`
    pub fn from_env() -> IngestResult<Self> {
        let workers = env_or("INGEST_WORKERS", DEFAULT_WORKERS);
        let config = Self {
            workers,
            queue_capacity: env_or("INGEST_QUEUE_CAPACITY", workers),
            progress_interval: env_or("INGEST_PROGRESS_INTERVAL", DEFAULT_PROGRESS_INTERVAL),
            request_timeout_secs: std::env::var("INGEST_REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|secs| *secs > 0),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self.queue_capacity = workers;
        self
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn validate(&self) -> IngestResult<()> {
        if self.workers == 0 {
            return Err(IngestError::Config("workers must be greater than 0".to_string()));
        }
        if self.queue_capacity == 0 {
            return Err(IngestError::Config(
                "queue_capacity must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Database pool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
            min_connections: DEFAULT_DATABASE_MIN_CONNECTIONS,
            connect_timeout_secs: DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
            acquire_timeout_secs: DEFAULT_DATABASE_ACQUIRE_TIMEOUT_SECS,
            idle_timeout_secs: DEFAULT_DATABASE_IDLE_TIMEOUT_SECS,
        }
    }
}

impl DatabaseConfig {
    /// Load from `DATABASE_URL`, `DATABASE_MAX_CONNECTIONS`,
    /// `DATABASE_MIN_CONNECTIONS`, `DATABASE_CONNECT_TIMEOUT`,
    /// `DATABASE_ACQUIRE_TIMEOUT` and `DATABASE_IDLE_TIMEOUT`
    pub fn from_env() -> IngestResult<Self> {
        let config = Self {
            url: std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            max_connections: env_or("DATABASE_MAX_CONNECTIONS", DEFAULT_DATABASE_MAX_CONNECTIONS),
            min_connections: env_or("DATABASE_MIN_CONNECTIONS", DEFAULT_DATABASE_MIN_CONNECTIONS),
            connect_timeout_secs: env_or(
                "DATABASE_CONNECT_TIMEOUT",
                DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
            ),
            acquire_timeout_secs: env_or(
                "DATABASE_ACQUIRE_TIMEOUT",
                DEFAULT_DATABASE_ACQUIRE_TIMEOUT_SECS,
            ),
            idle_timeout_secs: env_or("DATABASE_IDLE_TIMEOUT", DEFAULT_DATABASE_IDLE_TIMEOUT_SECS),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> IngestResult<()> {
        if self.url.is_empty() {
            return Err(IngestError::Config("Database URL cannot be empty".to_string()));
        }

        if self.max_connections == 0 {
            return Err(IngestError::Config(
                "Database max_connections must be greater than 0".to_string(),
            ));
        }

        if self.min_connections > self.max_connections {
            return Err(IngestError::Config(format!(
                "Database min_connections ({}) cannot be greater than max_connections ({})",
                self.min_connections, self.max_connections
            )));
        }

        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(IngestError::Config(
                "Database connect and acquire timeouts must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Open a connection pool and prove it reachable.
    ///
    /// The first connection must come up within `connect_timeout_secs`.
    /// Afterwards writers wait up to `acquire_timeout_secs` for a free
    /// connection.
    pub async fn open_pool(&self) -> IngestResult<PgPool> {
        let pool = PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(Duration::from_secs(self.acquire_timeout_secs))
            .idle_timeout(Duration::from_secs(self.idle_timeout_secs))
            .connect_lazy(&self.url)?;

        let connect_timeout = Duration::from_secs(self.connect_timeout_secs);
        match tokio::time::timeout(connect_timeout, pool.acquire()).await {
            Ok(Ok(_conn)) => Ok(pool),
            Ok(Err(e)) => {
                pool.close().await;
                Err(e.into())
            },
            Err(_) => {
                pool.close().await;
                Err(IngestError::Database(sqlx::Error::PoolTimedOut))
            },
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
