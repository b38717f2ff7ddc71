//! Integration tests for the upload endpoint
//!
//! Drive the full router with `oneshot`. No database is running: the pool
//! settings point at a closed port, which covers the connection-failure path
//! and proves validation happens before any connection attempt.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use cashback_server::{api::create_router, config::Config};
use serde_json::Value;
use tower::ServiceExt;

const BOUNDARY: &str = "cashback-test-boundary";

fn test_config() -> Config {
    let mut config = Config::default();
    config.database.url = "postgresql://postgres@127.0.0.1:1/cashback".to_string();
    config.database.min_connections = 0;
    config.database.connect_timeout_secs = 2;
    config
}

fn app() -> Router {
    create_router(&test_config())
}

fn multipart_body(field: &str, content: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"sample.csv\"\r\nContent-Type: text/csv\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(query: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/upload{}", query))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

const SAMPLE: &[u8] = b"No Waybill;Tgl Pengiriman\r\n100;2023-05-01\r\n";

#[tokio::test]
async fn test_health() {
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

    let (status, json) = send(app(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["status"], "healthy");
}

#[tokio::test]
async fn test_upload_without_multipart_body() {
    let request = Request::builder()
        .method("POST")
        .uri("/upload?month=may&year=2023")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();

    let (status, json) = send(app(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
    assert_eq!(json["error"]["message"], "Failed to read the uploaded file");
}

#[tokio::test]
async fn test_upload_without_file_field() {
    let request = upload_request("?month=may&year=2023", multipart_body("document", SAMPLE));

    let (status, json) = send(app(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "INVALID_UPLOAD");
    assert_eq!(json["error"]["message"], "Failed to read the uploaded file");
}

#[tokio::test]
async fn test_missing_file_reported_before_missing_date() {
    let request = upload_request("", multipart_body("document", SAMPLE));

    let (status, json) = send(app(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["message"], "Failed to read the uploaded file");
}

#[tokio::test]
async fn test_upload_without_month() {
    let request = upload_request("?year=2023", multipart_body("file", SAMPLE));

    let (status, json) = send(app(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "INVALID_DATE");
    assert_eq!(json["error"]["message"], "Invalid date parameters");
}

#[tokio::test]
async fn test_upload_without_year() {
    let request = upload_request("?month=may", multipart_body("file", SAMPLE));

    let (status, json) = send(app(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["message"], "Invalid date parameters");
}

#[tokio::test]
async fn test_upload_with_unsafe_month() {
    let request = upload_request(
        "?month=may%3B%20drop%20table&year=2023",
        multipart_body("file", SAMPLE),
    );

    let (status, json) = send(app(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["message"], "Invalid date parameters");
}

#[tokio::test]
async fn test_upload_with_unreachable_database() {
    let request = upload_request("?month=may&year=2023", multipart_body("file", SAMPLE));

    let (status, json) = send(app(), request).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["success"], false);
    assert_eq!(json["error"]["code"], "DATABASE_UNAVAILABLE");
    assert_eq!(json["error"]["message"], "Failed to connect to the database");
}

#[tokio::test]
async fn test_upload_over_size_limit() {
    let mut config = test_config();
    config.server.max_upload_bytes = 64;
    let content = vec![b'x'; 4096];

    let request = upload_request("?month=may&year=2023", multipart_body("file", &content));
    let (status, json) = send(create_router(&config), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["message"], "Failed to read the uploaded file");
}
