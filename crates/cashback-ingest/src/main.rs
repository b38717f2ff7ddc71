//! Cashback Ingest - load a local export file

use anyhow::{Context, Result};
use cashback_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use cashback_ingest::{
    DatabaseConfig, DateContext, IngestPipeline, InsertTarget, PgJobSink, PipelineConfig,
};
use clap::Parser;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "cashback-ingest")]
#[command(author, version, about = "Load a cashback export file into PostgreSQL")]
struct Cli {
    /// Semicolon-delimited export file
    #[arg(short, long, default_value = "sample.csv")]
    file: PathBuf,

    /// Month of the destination schema (e.g. "may")
    #[arg(short, long)]
    month: String,

    /// Year of the destination schema (e.g. "2023")
    #[arg(short, long)]
    year: String,

    /// Number of writer workers (defaults to INGEST_WORKERS or 16)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Database URL (defaults to DATABASE_URL)
    #[arg(long)]
    database_url: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    let log_config = LogConfig::builder()
        .level(log_level)
        .output(LogOutput::Both)
        .log_file_prefix("cashback-ingest.log")
        .filter_directives("sqlx=warn")
        .build()
        .merge_env()?;

    let _log_guard = init_logging(&log_config)?;

    let context = DateContext::new(cli.month, cli.year)?;
    let target = InsertTarget::new(&context);

    let mut pipeline_config = PipelineConfig::from_env()?;
    if let Some(workers) = cli.workers {
        pipeline_config = pipeline_config.with_workers(workers);
    }

    let mut database = DatabaseConfig::from_env()?;
    if let Some(url) = cli.database_url {
        database.url = url;
    }

    let input = tokio::fs::read(&cli.file)
        .await
        .with_context(|| format!("Failed to read {}", cli.file.display()))?;

    let pool = database
        .open_pool()
        .await
        .context("Failed to connect to the database")?;

    info!(file = %cli.file.display(), schema = %target.schema(), "Ingesting file");

    let pipeline = IngestPipeline::new(PgJobSink::new(pool.clone(), target), pipeline_config)?;

    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Received Ctrl+C, cancelling ingestion");
                cancel.cancel();
            }
        })
    };

    let summary = pipeline.run(&input, cancel).await;
    ctrl_c.abort();
    pool.close().await;

    info!(
        month = %context.month(),
        year = %context.year(),
        rows_accepted = summary.rows_accepted,
        inserts_failed = summary.inserts_failed,
        "Data inserted in {} seconds",
        summary.elapsed_seconds_ceil()
    );

    Ok(())
}
