//! Cashback Server - Main entry point

use anyhow::Result;
use cashback_common::logging::{init_logging, LogConfig, LogOutput};
use tracing::info;

use cashback_server::{api, config::Config};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Environment variables take precedence over these defaults
    let log_config = LogConfig::builder()
        .output(LogOutput::Both)
        .log_file_prefix("cashback-server.log")
        .filter_directives("cashback_server=debug,cashback_ingest=info,tower_http=debug,sqlx=warn")
        .build()
        .merge_env()?;

    let _log_guard = init_logging(&log_config)?;

    info!("Starting cashback server");

    let config = Config::load()?;
    info!(
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    api::serve(config).await
}
