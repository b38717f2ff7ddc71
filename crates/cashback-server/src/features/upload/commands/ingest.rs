use cashback_ingest::{
    DatabaseConfig, DateContext, IngestError, IngestPipeline, IngestSummary, InsertTarget,
    PgJobSink, PipelineConfig,
};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::error::AppError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestUploadCommand {
    pub month: Option<String>,
    pub year: Option<String>,
    #[serde(skip)]
    pub content: Vec<u8>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestUploadResponse {
    pub message: String,
    pub month: String,
    pub year: String,
    pub schema: String,
    pub elapsed_seconds: u64,
    pub summary: IngestSummary,
}

#[derive(Debug, thiserror::Error)]
pub enum IngestUploadError {
    #[error("Month is required and cannot be empty")]
    MonthRequired,
    #[error("Year is required and cannot be empty")]
    YearRequired,
    #[error(transparent)]
    InvalidDate(IngestError),
    #[error("Database connection failed: {0}")]
    Connect(#[source] IngestError),
    #[error("Pipeline configuration rejected: {0}")]
    Pipeline(#[source] IngestError),
}

impl From<IngestUploadError> for AppError {
    fn from(err: IngestUploadError) -> Self {
        match err {
            IngestUploadError::Connect(e) => AppError::DatabaseUnavailable(e),
            IngestUploadError::Pipeline(e) => AppError::Config(e),
            other => AppError::InvalidDate(other.to_string()),
        }
    }
}

impl IngestUploadCommand {
    pub fn validate(&self) -> Result<DateContext, IngestUploadError> {
        let month = required(self.month.as_deref()).ok_or(IngestUploadError::MonthRequired)?;
        let year = required(self.year.as_deref()).ok_or(IngestUploadError::YearRequired)?;

        DateContext::new(month, year).map_err(IngestUploadError::InvalidDate)
    }
}

fn required(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Whole seconds, rounded up
pub fn elapsed_seconds_ceil(elapsed: Duration) -> u64 {
    elapsed.as_secs() + u64::from(elapsed.subsec_nanos() > 0)
}

pub fn completion_message(seconds: u64, context: &DateContext) -> String {
    format!(
        "Data inserted successfully in {} seconds for month {}, year {}",
        seconds,
        context.month(),
        context.year()
    )
}

/// Validate the request, open a pool for it and run the whole upload through
/// the ingestion pipeline. The pool is closed before returning.
///
/// `started` is when the request arrived; the reported duration covers the
/// multipart read and the pool opening as well as the inserts.
#[tracing::instrument(skip(database, pipeline, command, started), fields(bytes = command.content.len()))]
pub async fn handle(
    database: &DatabaseConfig,
    pipeline: &PipelineConfig,
    command: IngestUploadCommand,
    started: Instant,
) -> Result<IngestUploadResponse, IngestUploadError> {
    let context = command.validate()?;
    pipeline.validate().map_err(IngestUploadError::Pipeline)?;
    let target = InsertTarget::new(&context);
    let schema = target.schema().to_string();

    let pool = database
        .open_pool()
        .await
        .map_err(IngestUploadError::Connect)?;

    tracing::info!(schema = %schema, "Ingesting upload");

    let ingest = IngestPipeline::new(PgJobSink::new(pool.clone(), target), pipeline.clone())
        .map_err(IngestUploadError::Pipeline)?;

    // Dropping the request (client gone) stops the writers
    let cancel = CancellationToken::new();
    let _cancel_on_drop = cancel.clone().drop_guard();

    let summary = ingest.run(&command.content, cancel).await;
    pool.close().await;

    let elapsed_seconds = elapsed_seconds_ceil(started.elapsed());
    let message = completion_message(elapsed_seconds, &context);

    Ok(IngestUploadResponse {
        message,
        month: context.month().to_string(),
        year: context.year().to_string(),
        schema,
        elapsed_seconds,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(month: Option<&str>, year: Option<&str>) -> IngestUploadCommand {
        IngestUploadCommand {
            month: month.map(String::from),
            year: year.map(String::from),
            content: b"header\n".to_vec(),
        }
    }

    fn unreachable_database() -> DatabaseConfig {
        DatabaseConfig {
            url: "postgresql://postgres@127.0.0.1:1/cashback".to_string(),
            min_connections: 0,
            connect_timeout_secs: 2,
            ..DatabaseConfig::default()
        }
    }

    #[test]
    fn test_validation_success() {
        let context = command(Some("May"), Some("2023")).validate().unwrap();
        assert_eq!(context.schema_name(), "cashback_may_2023");
    }

    #[test]
    fn test_validation_missing_month() {
        assert!(matches!(
            command(None, Some("2023")).validate(),
            Err(IngestUploadError::MonthRequired)
        ));
    }

    #[test]
    fn test_validation_blank_year() {
        assert!(matches!(
            command(Some("may"), Some("  ")).validate(),
            Err(IngestUploadError::YearRequired)
        ));
    }

    #[test]
    fn test_validation_rejects_identifier_injection() {
        assert!(matches!(
            command(Some("may; drop"), Some("2023")).validate(),
            Err(IngestUploadError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_error_mapping() {
        assert!(matches!(
            AppError::from(IngestUploadError::MonthRequired),
            AppError::InvalidDate(_)
        ));
        assert!(matches!(
            AppError::from(IngestUploadError::Connect(IngestError::Config("x".into()))),
            AppError::DatabaseUnavailable(_)
        ));
    }

    #[tokio::test]
    async fn test_date_checked_before_connecting() {
        let result = handle(
            &unreachable_database(),
            &PipelineConfig::default(),
            command(Some("may"), None),
            Instant::now(),
        )
        .await;

        assert!(matches!(result, Err(IngestUploadError::YearRequired)));
    }

    #[tokio::test]
    async fn test_unreachable_database() {
        let result = handle(
            &unreachable_database(),
            &PipelineConfig::default(),
            command(Some("may"), Some("2023")),
            Instant::now(),
        )
        .await;

        assert!(matches!(result, Err(IngestUploadError::Connect(_))));
    }

    #[tokio::test]
    async fn test_zero_queue_capacity_rejected_before_connecting() {
        let pipeline = PipelineConfig {
            queue_capacity: 0,
            ..PipelineConfig::default()
        };

        let result = handle(
            &unreachable_database(),
            &pipeline,
            command(Some("may"), Some("2023")),
            Instant::now(),
        )
        .await;

        let err = result.unwrap_err();
        assert!(matches!(err, IngestUploadError::Pipeline(IngestError::Config(_))));
        assert!(matches!(AppError::from(err), AppError::Config(_)));
    }

    #[test]
    fn test_elapsed_seconds_round_up() {
        assert_eq!(elapsed_seconds_ceil(Duration::from_millis(1200)), 2);
        assert_eq!(elapsed_seconds_ceil(Duration::from_nanos(1)), 1);
        assert_eq!(elapsed_seconds_ceil(Duration::from_secs(3)), 3);
        assert_eq!(elapsed_seconds_ceil(Duration::ZERO), 0);
    }

    #[test]
    fn test_completion_message() {
        let context = DateContext::new("may", "2023").unwrap();

        assert_eq!(
            completion_message(2, &context),
            "Data inserted successfully in 2 seconds for month may, year 2023"
        );
    }
}
