pub mod response;

use axum::{response::IntoResponse, routing::get, Json, Router};
use serde_json::json;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tower_http::compression::CompressionLayer;

use crate::config::Config;
use crate::features;
use crate::middleware;
use response::ApiResponse;

/// Bind and serve until SIGINT/SIGTERM, then give in-flight uploads up to
/// `shutdown_timeout_secs` to finish
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let app = create_router(&config);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server listening on {}", addr);

    let shutdown = CancellationToken::new();
    let mut server = tokio::spawn(
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown.clone().cancelled_owned())
            .into_future(),
    );

    let grace = Duration::from_secs(config.server.shutdown_timeout_secs);
    tokio::select! {
        result = &mut server => {
            result??;
            return Ok(());
        },
        _ = shutdown_signal() => {
            tracing::info!(
                "Waiting up to {} seconds for connections to close",
                grace.as_secs()
            );
            shutdown.cancel();
        },
    }

    match tokio::time::timeout(grace, server).await {
        Ok(result) => {
            result??;
            tracing::info!("Server shut down gracefully");
        },
        Err(_) => tracing::warn!("Shutdown timeout elapsed, dropping open connections"),
    }

    Ok(())
}

/// Create the application router with all routes and middleware
pub fn create_router(config: &Config) -> Router {
    let feature_state = features::FeatureState {
        database: config.database.clone(),
        pipeline: config.ingest.clone(),
    };

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(features::router(feature_state))
        // Apply layers from innermost to outermost
        .layer(middleware::body_limit_layer(config.server.max_upload_bytes))
        .layer(CompressionLayer::new())
        .layer(middleware::tracing_layer())
        .layer(middleware::cors_layer(&config.cors))
}

async fn root() -> impl IntoResponse {
    Json(json!({
        "name": "Cashback Server",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

/// Liveness check; uploads open their own pools so there is no shared
/// connection to check
async fn health() -> ApiResponse<serde_json::Value> {
    ApiResponse::success(json!({ "status": "healthy" }))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, starting graceful shutdown");
        },
    }
}
