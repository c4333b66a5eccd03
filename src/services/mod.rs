//! Application services.

mod ingest;

pub use ingest::{IngestService, ALLOWED_CONTENT_TYPES, MAX_PAGE_TEXT_CHARS, MAX_UPLOAD_BYTES};
