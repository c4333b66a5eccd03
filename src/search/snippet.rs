//! Best-snippet extraction from a matched page.
//!
//! The page is cut into overlapping chunks, each chunk is rescored
//! against the query, and the winner becomes the displayed snippet. A
//! winner that starts mid-sentence is extended backward to the nearest
//! prior sentence boundary so the reader is not dropped into a
//! fragment.

use super::scoring::score;

/// Chunk width, in characters.
pub const CHUNK_LEN: usize = 200;
/// Distance between chunk starts; chunks overlap by
/// `CHUNK_LEN - CHUNK_STRIDE` characters.
pub const CHUNK_STRIDE: usize = 150;

/// Extract the best-matching snippet of `text` for `query`.
///
/// Returns `None` only when the text has no visible content to quote.
pub fn best_snippet(text: &str, query: &str) -> Option<String> {
    if text.trim().is_empty() {
        return None;
    }

    let chars: Vec<char> = text.chars().collect();
    let (start, chunk) = best_chunk(&chars, query)?;

    let mut snippet = chunk;
    // A non-first chunk that starts mid-sentence gets the tail of the
    // previous sentence prepended.
    let starts_upper = snippet
        .chars()
        .next()
        .map(|c| c.is_uppercase())
        .unwrap_or(false);
    if start > 0 && !starts_upper {
        if let Some(lead) = preceding_sentence_tail(&chars, start) {
            snippet = format!("{}{}", lead, snippet);
        }
    }

    let cleaned = snippet
        .replace(['\r', '\n'], " ")
        .trim()
        .to_string();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Slice the text into overlapping chunks and return the start offset
/// and content of the highest-scoring one. Earlier chunks win ties.
fn best_chunk(chars: &[char], query: &str) -> Option<(usize, String)> {
    let mut best: Option<(usize, String, f64)> = None;

    let mut start = 0;
    while start < chars.len() {
        let end = (start + CHUNK_LEN).min(chars.len());
        let chunk: String = chars[start..end].iter().collect();
        let chunk_score = score(&chunk, query);

        match &best {
            Some((_, _, top)) if chunk_score <= *top => {}
            _ => best = Some((start, chunk, chunk_score)),
        }

        if end == chars.len() {
            break;
        }
        start += CHUNK_STRIDE;
    }

    best.map(|(start, chunk, _)| (start, chunk))
}

/// Text from the nearest period before `start` up to `start`, or
/// `None` when no sentence boundary precedes the chunk.
fn preceding_sentence_tail(chars: &[char], start: usize) -> Option<String> {
    let dot = chars[..start].iter().rposition(|&c| c == '.')?;
    if dot + 1 >= start {
        return None;
    }
    Some(chars[dot + 1..start].iter().collect())
}
