//! Page model for per-page extracted text.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One page's worth of extracted text belonging to a document.
///
/// Identity is the `(document_id, page_number)` pair; writing the same
/// page twice overwrites rather than duplicates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    /// Parent document ID.
    pub document_id: String,
    /// Page number (1-indexed).
    pub page_number: u32,
    /// Extracted plain text, already truncated to the persisted limit.
    pub text: String,
    /// Mean OCR confidence of the retained lines, 0-100.
    pub confidence: f64,
    /// Viewable-copy blob key inherited from the parent document.
    pub file_location: String,
    /// When this page record was last written.
    pub updated_at: DateTime<Utc>,
}

impl Page {
    pub fn new(
        document_id: String,
        page_number: u32,
        text: String,
        confidence: f64,
        file_location: String,
    ) -> Self {
        Self {
            document_id,
            page_number,
            text,
            confidence,
            file_location,
            updated_at: Utc::now(),
        }
    }
}
