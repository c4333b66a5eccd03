//! Document lifecycle coordination.
//!
//! Owns the state machine from upload through OCR completion: `submit`
//! validates and stores an upload, starts the OCR job, and records the
//! document as `OcrRunning`; `finalize` aggregates the job's output
//! into page records and flips the document to `Ready` (or `Failed`).

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ServiceError;
use crate::models::{Document, DocumentStatus, Page};
use crate::ocr::{Aggregator, OcrClient, OcrError};
use crate::repository::Repository;
use crate::storage::{object_key, page_text_key, BlobStore, NS_RAW, NS_VIEWABLE};

/// Upload size bound.
pub const MAX_UPLOAD_BYTES: usize = 8 * 1024 * 1024;

/// Persisted page text is truncated to this many characters. A storage
/// constraint, not a ranking one: text beyond it is simply not indexed.
pub const MAX_PAGE_TEXT_CHARS: usize = 30_000;

/// Content types accepted for upload.
pub const ALLOWED_CONTENT_TYPES: &[&str] = &[
    "application/pdf",
    "image/jpeg",
    "image/png",
    "image/tiff",
];

/// Coordinates the document lifecycle against the external stores.
pub struct IngestService {
    repo: Arc<Repository>,
    blobs: Arc<BlobStore>,
    ocr: Arc<dyn OcrClient>,
    aggregator: Aggregator,
}

impl IngestService {
    pub fn new(
        repo: Arc<Repository>,
        blobs: Arc<BlobStore>,
        ocr: Arc<dyn OcrClient>,
        aggregator: Aggregator,
    ) -> Self {
        Self {
            repo,
            blobs,
            ocr,
            aggregator,
        }
    }

    /// Accept an upload: validate, store the processing and viewable
    /// copies, start the OCR job, and create the document record.
    ///
    /// Validation failures happen before any store write. If the OCR
    /// submission fails the stored copies are left behind as orphans
    /// and no document record is created.
    pub async fn submit(
        &self,
        bytes: &[u8],
        filename: &str,
        content_type: &str,
    ) -> Result<String, ServiceError> {
        if !ALLOWED_CONTENT_TYPES.contains(&content_type) {
            return Err(ServiceError::UnsupportedMediaType(content_type.to_string()));
        }
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(ServiceError::PayloadTooLarge {
                size: bytes.len(),
                limit: MAX_UPLOAD_BYTES,
            });
        }

        let doc_id = Uuid::new_v4().to_string();
        let raw_key = object_key(NS_RAW, &doc_id, filename);
        let viewable_key = object_key(NS_VIEWABLE, &doc_id, filename);

        self.blobs.put(&raw_key, bytes)?;
        self.blobs.put(&viewable_key, bytes)?;

        let job_ref = match self.ocr.submit(&raw_key).await {
            Ok(job_ref) => job_ref,
            Err(err) => {
                warn!(doc_id = %doc_id, "OCR submission failed, orphaning stored copies: {}", err);
                return Err(ServiceError::IngestFailed(err.to_string()));
            }
        };

        let mut doc = Document::new(doc_id.clone(), filename.to_string(), viewable_key);
        doc.start_ocr(job_ref);
        self.repo.insert_document(&doc)?;

        info!(doc_id = %doc_id, filename, "document submitted, OCR running");
        Ok(doc_id)
    }

    /// Collect a document's OCR output into page records and mark it
    /// ready for querying.
    ///
    /// Idempotent: rerunning after success re-derives the same pages
    /// from the same job and overwrites them in place. An OCR timeout
    /// or job failure marks the document `Failed` and propagates;
    /// persistence faults leave it `OcrRunning` so the external
    /// trigger can retry.
    pub async fn finalize(&self, doc_id: &str) -> Result<usize, ServiceError> {
        let doc = self
            .repo
            .get_document(doc_id)?
            .ok_or_else(|| ServiceError::DocumentNotFound(doc_id.to_string()))?;
        let job_ref = doc.ocr_job_ref.clone().ok_or_else(|| {
            ServiceError::Internal(anyhow::anyhow!(
                "document {} has no OCR job reference",
                doc_id
            ))
        })?;

        let pages = match self.aggregator.aggregate(&job_ref).await {
            Ok(pages) => pages,
            Err(err @ (OcrError::Timeout | OcrError::JobFailed(_))) => {
                warn!(doc_id, "OCR aggregation failed: {}", err);
                self.repo.advance_status(doc_id, DocumentStatus::Failed)?;
                return Err(err.into());
            }
            Err(OcrError::Service(msg)) => {
                return Err(ServiceError::Internal(anyhow::anyhow!(
                    "OCR service fault: {}",
                    msg
                )));
            }
        };

        let mut count = 0;
        for page in &pages {
            let text = truncate_chars(&page.text, MAX_PAGE_TEXT_CHARS);
            self.blobs
                .put(&page_text_key(doc_id, page.page_number), text.as_bytes())?;
            self.repo.upsert_page(&Page::new(
                doc_id.to_string(),
                page.page_number,
                text,
                page.confidence,
                doc.file_location.clone(),
            ))?;
            count += 1;
        }

        self.repo.advance_status(doc_id, DocumentStatus::Ready)?;
        info!(doc_id, pages = count, "document ready for query");
        Ok(count)
    }
}

/// Truncate to a character count without splitting a code point.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

impl From<OcrError> for ServiceError {
    fn from(err: OcrError) -> Self {
        match err {
            OcrError::Timeout => Self::OcrTimeout,
            OcrError::JobFailed(msg) => Self::OcrJobFailed(msg),
            OcrError::Service(msg) => Self::Internal(anyhow::anyhow!(msg)),
        }
    }
}
