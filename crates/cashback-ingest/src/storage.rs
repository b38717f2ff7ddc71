//! Job sinks
//!
//! [`JobSink`] is what a writer worker calls once per job. [`PgJobSink`]
//! performs one parameterized INSERT on a pooled connection; the connection
//! goes back to the pool as soon as the attempt finishes.

use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgPool};
use sqlx::query::Query;
use sqlx::Postgres;

use crate::destination::InsertTarget;
use crate::error::SinkError;
use crate::models::{IngestJob, SqlValue};

#[async_trait]
pub trait JobSink: Send + Sync + 'static {
    /// Attempt to write one job
    async fn insert(&self, job: &IngestJob) -> Result<(), SinkError>;
}

/// Writes jobs to PostgreSQL
pub struct PgJobSink {
    pool: PgPool,
    target: InsertTarget,
}

impl PgJobSink {
    pub fn new(pool: PgPool, target: InsertTarget) -> Self {
        Self { pool, target }
    }

    pub fn target(&self) -> &InsertTarget {
        &self.target
    }
}

#[async_trait]
impl JobSink for PgJobSink {
    async fn insert(&self, job: &IngestJob) -> Result<(), SinkError> {
        let query = bind_values(sqlx::query(self.target.statement()), job.values());

        let mut conn = self.pool.acquire().await.map_err(SinkError::Acquire)?;
        query
            .execute(&mut *conn)
            .await
            .map_err(SinkError::Insert)?;

        Ok(())
    }
}

fn bind_values<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    values: &'q [SqlValue],
) -> Query<'q, Postgres, PgArguments> {
    for value in values {
        query = match value {
            SqlValue::Text(v) => query.bind(v.as_str()),
            SqlValue::Int(v) => query.bind(*v),
            SqlValue::Float(v) => query.bind(*v),
            SqlValue::Date(v) => query.bind(*v),
            SqlValue::Timestamp(v) => query.bind(*v),
        };
    }
    query
}
