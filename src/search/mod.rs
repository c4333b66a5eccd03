//! Query-time search: lexical scoring, snippet extraction, and the
//! ranking engine over ready documents.

mod engine;
mod scoring;
mod snippet;

pub use engine::{QueryResponse, QuerySource, SearchEngine, MAX_RESULTS, SCORE_CUTOFF};
pub use scoring::{boost, query_terms, score};
pub use snippet::best_snippet;
