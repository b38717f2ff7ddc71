pub mod ingest;

pub use ingest::{IngestUploadCommand, IngestUploadError, IngestUploadResponse};
