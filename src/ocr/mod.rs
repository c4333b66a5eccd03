//! OCR service integration.
//!
//! Notedex does not run OCR itself. Documents are submitted to an
//! external asynchronous OCR service which eventually yields per-line
//! text blocks with confidence scores. This module holds the client
//! contract for that service, the HTTP implementation, and the
//! aggregator that turns raw line blocks into per-page text records.

mod aggregator;
mod client;

pub use aggregator::{Aggregator, PageText};
pub use client::{HttpOcrClient, HttpOcrConfig};

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// Errors from the OCR service integration.
#[derive(Debug, Error)]
pub enum OcrError {
    /// The job did not reach a terminal state within the polling bound.
    #[error("timed out waiting for OCR job")]
    Timeout,

    /// The service reported the job as failed.
    #[error("OCR job failed: {0}")]
    JobFailed(String),

    /// Transport or protocol fault talking to the service.
    #[error("OCR service error: {0}")]
    Service(String),
}

/// Status of an asynchronous OCR job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Succeeded,
    PartialSuccess,
    Failed,
    /// Anything the service reports that is not terminal.
    #[serde(other)]
    InProgress,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

/// One poll of a job's status, with the service's error message when
/// the job failed.
#[derive(Debug, Clone, Deserialize)]
pub struct JobPoll {
    pub status: JobStatus,
    #[serde(default)]
    pub message: Option<String>,
}

/// Type of a raw OCR block. Only `Line` blocks carry the text we
/// consume; word-level and geometry blocks are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockType {
    Line,
    Word,
    #[serde(other)]
    Other,
}

/// A raw block emitted by the OCR service.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineBlock {
    pub block_type: BlockType,
    /// Page the block belongs to; services omit it for single-page input.
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default)]
    pub text: String,
    /// Recognition confidence, 0-100.
    #[serde(default)]
    pub confidence: f64,
}

fn default_page() -> u32 {
    1
}

/// One batch of result blocks plus the continuation token for the next.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineBatch {
    pub blocks: Vec<LineBlock>,
    #[serde(default)]
    pub next_token: Option<String>,
}

/// Client contract for the external OCR service.
///
/// Injected into the coordinator and aggregator so the core stays
/// testable without a live service.
#[async_trait]
pub trait OcrClient: Send + Sync {
    /// Start an OCR job for a stored document. Returns the job handle.
    async fn submit(&self, blob_ref: &str) -> Result<String, OcrError>;

    /// Poll the current status of a job. Safe to call repeatedly.
    async fn poll_status(&self, job_ref: &str) -> Result<JobPoll, OcrError>;

    /// Fetch the next batch of result blocks. Pass the token returned
    /// by the previous call; `None` requests the first batch.
    async fn fetch_lines(
        &self,
        job_ref: &str,
        token: Option<&str>,
    ) -> Result<LineBatch, OcrError>;
}
