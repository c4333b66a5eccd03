//! Query-time ranking over ready documents.
//!
//! Every query is a full scan: all pages of all `Ready` documents are
//! scored, the top matches are snippet-extracted, and each result
//! carries a signed deep link to its page. The scan-per-query shape is
//! deliberate; at notebook scale it beats maintaining an index.

use std::sync::Arc;

use serde::Serialize;
use tracing::error;

use super::scoring::score;
use super::snippet::best_snippet;
use crate::models::{DocumentStatus, Page};
use crate::repository::Repository;
use crate::signer::UrlSigner;

/// Pages scoring at or below this are never returned.
pub const SCORE_CUTOFF: f64 = 0.1;
/// Maximum number of result pages per query.
pub const MAX_RESULTS: usize = 3;
/// Queries with fewer non-whitespace characters than this are refused.
pub const MIN_QUERY_CHARS: usize = 3;
/// Result links stay valid this long.
pub const LINK_EXPIRY_SECS: u64 = 3600;

/// Page-store read batch size for the per-document drain.
const PAGE_BATCH: usize = 100;

const ANSWER_TOO_SHORT: &str =
    "Please ask a more specific question (at least 3 characters).";
const ANSWER_EMPTY_INDEX: &str = "No notes indexed yet.";
const ANSWER_NO_MATCH: &str =
    "I couldn't find relevant information about that in your notes.";
const ANSWER_NO_SNIPPET: &str =
    "I couldn't find specific information about that in your notes.";
const ANSWER_LEAD_IN: &str = "Here's what I found in your notes:";

/// One ranked source returned to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct QuerySource {
    /// Best-matching passage from the page; empty when the page had no
    /// quotable content.
    pub snippet: String,
    /// Page number within the source document.
    pub page: u32,
    /// Signed, expiring link to the viewable file, deep-linked to the
    /// page.
    pub url: String,
    /// Relevance as a rounded percentage.
    pub relevance: u32,
}

/// Response to a free-text query. Always well-formed; failures degrade
/// to an empty source list.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub answer: String,
    pub sources: Vec<QuerySource>,
}

impl QueryResponse {
    fn empty(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            sources: Vec::new(),
        }
    }
}

struct Candidate {
    page: Page,
    score: f64,
}

/// Ranks pages of ready documents against free-text queries.
pub struct SearchEngine {
    repo: Arc<Repository>,
    signer: Arc<UrlSigner>,
}

impl SearchEngine {
    pub fn new(repo: Arc<Repository>, signer: Arc<UrlSigner>) -> Self {
        Self { repo, signer }
    }

    /// Answer a query. Never fails: malformed input, an empty corpus,
    /// and internal faults all produce a structured no-result response.
    pub fn rank(&self, query: &str) -> QueryResponse {
        let visible_chars = query.chars().filter(|c| !c.is_whitespace()).count();
        if visible_chars < MIN_QUERY_CHARS {
            return QueryResponse::empty(ANSWER_TOO_SHORT);
        }

        let pages = match self.ready_pages() {
            Ok(pages) => pages,
            Err(err) => {
                error!("query-time page scan failed: {}", err);
                return QueryResponse::empty(ANSWER_NO_MATCH);
            }
        };
        if pages.is_empty() {
            return QueryResponse::empty(ANSWER_EMPTY_INDEX);
        }

        let candidates: Vec<Candidate> = pages
            .into_iter()
            .map(|page| Candidate {
                score: score(&page.text, query),
                page,
            })
            .collect();

        let top = select_top(candidates);
        if top.is_empty() {
            return QueryResponse::empty(ANSWER_NO_MATCH);
        }

        let sources: Vec<QuerySource> = top
            .iter()
            .map(|candidate| QuerySource {
                snippet: best_snippet(&candidate.page.text, query).unwrap_or_default(),
                page: candidate.page.page_number,
                url: self.signer.sign(
                    &candidate.page.file_location,
                    LINK_EXPIRY_SECS,
                    candidate.page.page_number,
                ),
                relevance: (candidate.score * 100.0).round() as u32,
            })
            .collect();

        let snippets: Vec<&str> = sources
            .iter()
            .filter(|s| !s.snippet.is_empty())
            .map(|s| s.snippet.as_str())
            .collect();
        let answer = if snippets.is_empty() {
            ANSWER_NO_SNIPPET.to_string()
        } else {
            let bullets: Vec<String> =
                snippets.iter().map(|s| format!("- {}", s)).collect();
            format!("{}\n{}", ANSWER_LEAD_IN, bullets.join("\n"))
        };

        QueryResponse { answer, sources }
    }

    /// Point-in-time snapshot of every page belonging to a currently
    /// ready document.
    fn ready_pages(&self) -> crate::repository::Result<Vec<Page>> {
        let mut pages = Vec::new();
        for doc in self.repo.documents_with_status(DocumentStatus::Ready)? {
            let mut after = None;
            loop {
                let (batch, next) = self.repo.pages_for_document(&doc.id, after, PAGE_BATCH)?;
                pages.extend(batch);
                match next {
                    Some(key) => after = Some(key),
                    None => break,
                }
            }
        }
        Ok(pages)
    }
}

/// Apply the relevance cutoff, order by score (ties by document then
/// page for determinism), and keep the top results.
fn select_top(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    candidates.retain(|c| c.score > SCORE_CUTOFF);
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.page.document_id.cmp(&b.page.document_id))
            .then_with(|| a.page.page_number.cmp(&b.page.page_number))
    });
    candidates.truncate(MAX_RESULTS);
    candidates
}
