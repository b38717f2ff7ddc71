use axum::{
    extract::{
        multipart::MultipartRejection, rejection::QueryRejection, Multipart, Query, State,
    },
    routing::post,
    Router,
};
use serde::Deserialize;
use serde_json::json;
use std::time::Instant;
use uuid::Uuid;

use super::commands::{self, IngestUploadCommand};
use crate::api::response::ApiResponse;
use crate::error::{AppError, ApiResult};
use crate::features::FeatureState;

/// Name of the multipart field carrying the export file
pub const FILE_FIELD: &str = "file";

#[derive(Debug, Default, Deserialize)]
pub struct UploadParams {
    pub month: Option<String>,
    pub year: Option<String>,
}

pub fn upload_routes() -> Router<FeatureState> {
    Router::new().route("/upload", post(upload_file))
}

#[tracing::instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
async fn upload_file(
    State(state): State<FeatureState>,
    params: Result<Query<UploadParams>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<ApiResponse<commands::IngestUploadResponse>> {
    let started = Instant::now();

    // The file is checked before the date parameters
    let content = read_file_field(multipart).await?;
    let Query(params) = params.map_err(|e| AppError::InvalidDate(e.body_text()))?;

    let command = IngestUploadCommand {
        month: params.month,
        year: params.year,
        content,
    };

    let response = commands::ingest::handle(&state.database, &state.pipeline, command, started).await?;

    tracing::info!(
        schema = %response.schema,
        rows_accepted = response.summary.rows_accepted,
        inserts_failed = response.summary.inserts_failed,
        "{}",
        response.message
    );

    let meta = json!({
        "rows_accepted": response.summary.rows_accepted,
        "elapsed_seconds": response.elapsed_seconds,
    });

    Ok(ApiResponse::success_with_meta(response, meta))
}

/// Read the bytes of the `file` field; other fields are ignored
async fn read_file_field(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Vec<u8>, AppError> {
    let mut multipart = multipart.map_err(|e| AppError::InvalidUpload(e.body_text()))?;
    let mut content: Option<Vec<u8>> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        AppError::InvalidUpload(format!("Failed to read multipart field: {}", e))
    })? {
        if field.name() == Some(FILE_FIELD) {
            let data = field.bytes().await.map_err(|e| {
                AppError::InvalidUpload(format!("Failed to read file bytes: {}", e))
            })?;
            content = Some(data.to_vec());
        }
    }

    content.ok_or_else(|| AppError::InvalidUpload("No file field found in multipart data".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routes_structure() {
        let router = upload_routes();
        assert!(format!("{:?}", router).contains("Router"));
    }

    #[test]
    fn test_params_default_to_missing() {
        let params = UploadParams::default();
        assert!(params.month.is_none());
        assert!(params.year.is_none());
    }
}
