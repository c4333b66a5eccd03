//! Aggregation of raw OCR output into per-page text records.
//!
//! Waits for a submitted job to reach a terminal state, drains the
//! service's paginated block results, and folds line blocks into
//! per-page plain text with an aggregate confidence.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::{BlockType, JobStatus, LineBlock, OcrClient, OcrError};

/// Lines at or below this confidence are discarded entirely; they
/// contribute neither text nor to the page confidence mean.
pub const MIN_LINE_CONFIDENCE: f64 = 50.0;

/// Aggregated text for one page of a document.
#[derive(Debug, Clone, PartialEq)]
pub struct PageText {
    /// Page number (1-indexed).
    pub page_number: u32,
    /// Surviving lines joined with newlines, in encounter order.
    pub text: String,
    /// Mean confidence of the surviving lines, 0-100.
    pub confidence: f64,
}

/// Polls an OCR job to completion and aggregates its results.
pub struct Aggregator {
    client: Arc<dyn OcrClient>,
    poll_interval: Duration,
    max_poll_attempts: u32,
}

impl Aggregator {
    pub fn new(client: Arc<dyn OcrClient>, poll_interval: Duration, max_poll_attempts: u32) -> Self {
        Self {
            client,
            poll_interval,
            max_poll_attempts,
        }
    }

    /// Wait for the job to finish and return its pages, ascending by
    /// page number. Retriable: polling and fetching have no side
    /// effects beyond the bounded wait.
    pub async fn aggregate(&self, job_ref: &str) -> Result<Vec<PageText>, OcrError> {
        self.wait_for_completion(job_ref).await?;

        let mut blocks = Vec::new();
        let mut token: Option<String> = None;
        loop {
            let batch = self.client.fetch_lines(job_ref, token.as_deref()).await?;
            blocks.extend(batch.blocks);
            match batch.next_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }

        let pages = group_pages(blocks);
        debug!(job_ref, pages = pages.len(), "aggregated OCR result");
        Ok(pages)
    }

    /// Poll until the job is terminal, up to the attempt bound.
    async fn wait_for_completion(&self, job_ref: &str) -> Result<(), OcrError> {
        for attempt in 1..=self.max_poll_attempts {
            let poll = self.client.poll_status(job_ref).await?;
            debug!(job_ref, attempt, status = ?poll.status, "polled OCR job");

            match poll.status {
                JobStatus::Succeeded => return Ok(()),
                JobStatus::PartialSuccess => {
                    // Proceed; the reduced confidence shows up in the data.
                    warn!(job_ref, "OCR job completed with partial success");
                    return Ok(());
                }
                JobStatus::Failed => {
                    return Err(OcrError::JobFailed(
                        poll.message.unwrap_or_else(|| "unknown error".to_string()),
                    ));
                }
                JobStatus::InProgress => {
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }

        Err(OcrError::Timeout)
    }
}

/// Fold raw blocks into per-page text records.
///
/// Only `Line` blocks are consumed. Lines are grouped by page number
/// across all batches; low-confidence lines are dropped before either
/// the text join or the confidence mean, and a page with no surviving
/// lines is omitted. Output is ascending by page number.
pub fn group_pages(blocks: Vec<LineBlock>) -> Vec<PageText> {
    use std::collections::BTreeMap;

    let mut by_page: BTreeMap<u32, Vec<LineBlock>> = BTreeMap::new();
    for block in blocks {
        if block.block_type == BlockType::Line {
            by_page.entry(block.page).or_default().push(block);
        }
    }

    by_page
        .into_iter()
        .filter_map(|(page_number, lines)| {
            let surviving: Vec<&LineBlock> = lines
                .iter()
                .filter(|line| line.confidence > MIN_LINE_CONFIDENCE)
                .collect();
            if surviving.is_empty() {
                return None;
            }

            let text = surviving
                .iter()
                .map(|line| line.text.as_str())
                .collect::<Vec<_>>()
                .join("\n");
            let confidence = surviving.iter().map(|line| line.confidence).sum::<f64>()
                / surviving.len() as f64;

            Some(PageText {
                page_number,
                text,
                confidence,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::{JobPoll, LineBatch};
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn line(page: u32, text: &str, confidence: f64) -> LineBlock {
        LineBlock {
            block_type: BlockType::Line,
            page,
            text: text.to_string(),
            confidence,
        }
    }

    /// Scripted OCR client: a sequence of status polls, then batches.
    struct ScriptedClient {
        polls: Mutex<Vec<JobPoll>>,
        batches: Mutex<Vec<LineBatch>>,
    }

    impl ScriptedClient {
        fn new(polls: Vec<JobPoll>, batches: Vec<LineBatch>) -> Self {
            Self {
                polls: Mutex::new(polls),
                batches: Mutex::new(batches),
            }
        }
    }

    #[async_trait]
    impl OcrClient for ScriptedClient {
        async fn submit(&self, _blob_ref: &str) -> Result<String, OcrError> {
            Ok("job-1".to_string())
        }

        async fn poll_status(&self, _job_ref: &str) -> Result<JobPoll, OcrError> {
            let mut polls = self.polls.lock().unwrap();
            if polls.is_empty() {
                // Keep reporting in-progress once the script runs out.
                return Ok(JobPoll {
                    status: JobStatus::InProgress,
                    message: None,
                });
            }
            Ok(polls.remove(0))
        }

        async fn fetch_lines(
            &self,
            _job_ref: &str,
            _token: Option<&str>,
        ) -> Result<LineBatch, OcrError> {
            Ok(self.batches.lock().unwrap().remove(0))
        }
    }

    fn poll(status: JobStatus) -> JobPoll {
        JobPoll {
            status,
            message: None,
        }
    }

    #[test]
    fn test_low_confidence_lines_never_contribute() {
        let pages = group_pages(vec![
            line(1, "kept line", 90.0),
            line(1, "noise", 50.0),
            line(1, "also kept", 70.0),
        ]);

        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].text, "kept line\nalso kept");
        // Mean over survivors only: (90 + 70) / 2, not (90 + 50 + 70) / 3
        assert_eq!(pages[0].confidence, 80.0);
    }

    #[test]
    fn test_page_with_no_surviving_lines_is_dropped() {
        let pages = group_pages(vec![
            line(1, "good", 90.0),
            line(2, "bad", 30.0),
            line(2, "worse", 10.0),
        ]);

        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].page_number, 1);
    }

    #[test]
    fn test_non_line_blocks_ignored() {
        let mut word = line(1, "word-level", 99.0);
        word.block_type = BlockType::Word;
        let mut other = line(1, "geometry", 99.0);
        other.block_type = BlockType::Other;

        let pages = group_pages(vec![word, other, line(1, "the line", 80.0)]);
        assert_eq!(pages[0].text, "the line");
    }

    #[test]
    fn test_pages_ordered_ascending() {
        let pages = group_pages(vec![
            line(3, "three", 90.0),
            line(1, "one", 90.0),
            line(2, "two", 90.0),
        ]);
        let numbers: Vec<u32> = pages.iter().map(|p| p.page_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_aggregate_waits_then_drains_batches() {
        let client = Arc::new(ScriptedClient::new(
            vec![poll(JobStatus::InProgress), poll(JobStatus::Succeeded)],
            vec![
                LineBatch {
                    blocks: vec![line(1, "first", 90.0)],
                    next_token: Some("t1".to_string()),
                },
                LineBatch {
                    blocks: vec![line(1, "second", 80.0), line(2, "page two", 95.0)],
                    next_token: None,
                },
            ],
        ));

        let aggregator = Aggregator::new(client, Duration::from_millis(1), 10);
        let pages = aggregator.aggregate("job-1").await.unwrap();

        // Page 1 spans both batches and keeps encounter order.
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].text, "first\nsecond");
        assert_eq!(pages[1].text, "page two");
    }

    #[tokio::test]
    async fn test_aggregate_partial_success_proceeds() {
        let client = Arc::new(ScriptedClient::new(
            vec![poll(JobStatus::PartialSuccess)],
            vec![LineBatch {
                blocks: vec![line(1, "text", 60.0)],
                next_token: None,
            }],
        ));

        let aggregator = Aggregator::new(client, Duration::from_millis(1), 10);
        assert_eq!(aggregator.aggregate("job-1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_aggregate_failed_job_carries_message() {
        let client = Arc::new(ScriptedClient::new(
            vec![JobPoll {
                status: JobStatus::Failed,
                message: Some("unreadable input".to_string()),
            }],
            vec![],
        ));

        let aggregator = Aggregator::new(client, Duration::from_millis(1), 10);
        match aggregator.aggregate("job-1").await {
            Err(OcrError::JobFailed(msg)) => assert_eq!(msg, "unreadable input"),
            other => panic!("expected JobFailed, got {:?}", other.map(|p| p.len())),
        }
    }

    #[tokio::test]
    async fn test_aggregate_times_out_after_attempt_bound() {
        let client = Arc::new(ScriptedClient::new(vec![], vec![]));

        let aggregator = Aggregator::new(client, Duration::from_millis(1), 3);
        match aggregator.aggregate("job-1").await {
            Err(OcrError::Timeout) => {}
            other => panic!("expected Timeout, got {:?}", other.map(|p| p.len())),
        }
    }
}
