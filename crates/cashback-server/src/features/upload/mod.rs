pub mod commands;
pub mod routes;

pub use commands::{IngestUploadCommand, IngestUploadError, IngestUploadResponse};

pub use routes::upload_routes;
