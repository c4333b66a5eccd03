//! Service-level error taxonomy.
//!
//! Every failure surfaced to a caller carries a stable machine-readable
//! kind alongside the human-readable message. Unexpected faults are
//! wrapped in `Internal` and reported generically; the full detail is
//! logged at the boundary.

use thiserror::Error;

/// Errors surfaced by the ingestion and lifecycle operations.
///
/// The query path never returns these - `rank` degrades to an empty
/// result instead of failing.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("file too large: {size} bytes (limit {limit})")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("ingest failed: {0}")]
    IngestFailed(String),

    #[error("document not found: {0}")]
    DocumentNotFound(String),

    #[error("timed out waiting for OCR results")]
    OcrTimeout,

    #[error("OCR job failed: {0}")]
    OcrJobFailed(String),

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    /// Stable identifier for API responses and log correlation.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnsupportedMediaType(_) => "unsupported_media_type",
            Self::PayloadTooLarge { .. } => "payload_too_large",
            Self::IngestFailed(_) => "ingest_failed",
            Self::DocumentNotFound(_) => "document_not_found",
            Self::OcrTimeout => "ocr_timeout",
            Self::OcrJobFailed(_) => "ocr_job_failed",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<rusqlite::Error> for ServiceError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Internal(err.into())
    }
}
