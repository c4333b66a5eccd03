//! Document model and lifecycle state machine.
//!
//! A document moves forward through `uploaded -> ocr_running -> ready`,
//! with `failed` reachable while OCR is running. Status never moves
//! backward; retried operations observe the same terminal state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Uploaded,
    OcrRunning,
    Ready,
    Failed,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uploaded => "uploaded",
            Self::OcrRunning => "ocr_running",
            Self::Ready => "ready",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "uploaded" => Some(Self::Uploaded),
            "ocr_running" => Some(Self::OcrRunning),
            "ready" => Some(Self::Ready),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Whether a transition from `self` to `next` moves the lifecycle
    /// forward. Terminal states (`Ready`, `Failed`) accept nothing;
    /// re-applying the current state is a no-op, not a transition.
    pub fn can_advance(self, next: DocumentStatus) -> bool {
        use DocumentStatus::*;
        match (self, next) {
            (Uploaded, OcrRunning | Ready | Failed) => true,
            (OcrRunning, Ready | Failed) => true,
            _ => false,
        }
    }
}

/// A user-submitted file tracked through its processing lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier, assigned at upload time.
    pub id: String,
    /// Original client-supplied name (display only, not identity).
    pub filename: String,
    /// Current lifecycle status.
    pub status: DocumentStatus,
    /// Handle to the in-flight OCR job; set when status becomes
    /// `OcrRunning`, meaningless once the document is terminal.
    pub ocr_job_ref: Option<String>,
    /// Blob key of the viewable copy, used for link generation.
    pub file_location: String,
    /// When the document was uploaded.
    pub created_at: DateTime<Utc>,
    /// When the document was last modified.
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Create a freshly uploaded document.
    pub fn new(id: String, filename: String, file_location: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            filename,
            status: DocumentStatus::Uploaded,
            ocr_job_ref: None,
            file_location,
            created_at: now,
            updated_at: now,
        }
    }

    /// Record the submitted OCR job and advance to `OcrRunning`.
    pub fn start_ocr(&mut self, job_ref: String) {
        self.ocr_job_ref = Some(job_ref);
        self.status = DocumentStatus::OcrRunning;
        self.updated_at = Utc::now();
    }
}
