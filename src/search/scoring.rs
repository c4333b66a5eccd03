//! Lexical relevance scoring.
//!
//! `score` is a pure, deterministic function of a text and a query. It
//! blends two signals: how often the query terms occur at all (term
//! frequency) and how tightly distinct terms cluster together
//! (proximity, measured over a sliding character window). Questions
//! phrased with analytical lead words get a fixed multiplier.

/// Weight of the raw term-frequency signal.
pub const TERM_WEIGHT: f64 = 0.4;
/// Weight of the proximity signal.
pub const CONTEXT_WEIGHT: f64 = 0.6;
/// Width of the proximity window, in characters.
pub const CONTEXT_WINDOW: usize = 100;

/// Query terms shorter than this many characters are ignored.
const MIN_TERM_CHARS: usize = 3;

/// Question-starter boosts, checked in order; first match wins.
const BOOSTS: &[(&str, f64)] = &[
    ("what", 1.2),
    ("how", 1.2),
    ("why", 1.2),
    ("when", 1.2),
    ("where", 1.2),
    ("explain", 1.3),
    ("describe", 1.3),
    ("compare", 1.3),
    ("analyze", 1.4),
    ("discuss", 1.4),
    ("evaluate", 1.4),
];

/// Split a query into scoring terms: lower-cased runs of word
/// characters, keeping only those longer than 2 characters.
pub fn query_terms(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|term| term.chars().count() >= MIN_TERM_CHARS)
        .map(str::to_string)
        .collect()
}

/// Score a text against a query. Deterministic; 0 when nothing matches,
/// unbounded above as term occurrences accumulate.
pub fn score(text: &str, query: &str) -> f64 {
    let terms = query_terms(query);
    let (term_score, context_score) = if terms.is_empty() {
        (0.0, 0.0)
    } else {
        let lowered = text.to_lowercase();
        (
            term_score(&lowered, &terms),
            context_score(&lowered, &terms),
        )
    };

    (term_score * TERM_WEIGHT + context_score * CONTEXT_WEIGHT) * boost(query)
}

/// Total query-term occurrences, averaged over the number of terms.
fn term_score(lowered_text: &str, terms: &[String]) -> f64 {
    let total: usize = terms
        .iter()
        .map(|term| lowered_text.matches(term.as_str()).count())
        .sum();
    total as f64 / terms.len() as f64
}

/// Best proximity over all `CONTEXT_WINDOW`-character windows (stride
/// 1): the maximum number of distinct terms observed together in one
/// window, as a fraction of the term count.
///
/// Computed without materializing the windows: each term occurrence
/// covers a contiguous run of window start positions, so per-term
/// coverage is merged into a difference array and the best window
/// falls out of the prefix sums.
fn context_score(lowered_text: &str, terms: &[String]) -> f64 {
    let chars: Vec<char> = lowered_text.chars().collect();
    let n = chars.len();
    if n == 0 {
        return 0.0;
    }

    let window = CONTEXT_WINDOW.min(n);
    let starts = n - window + 1;
    let mut coverage = vec![0i32; starts + 1];

    let mut distinct: Vec<&String> = terms.iter().collect();
    distinct.sort();
    distinct.dedup();

    for term in distinct {
        let term_chars: Vec<char> = term.chars().collect();
        if term_chars.len() > window {
            continue;
        }

        // Occurrence at p is visible from window starts
        // [p + len - window, p], clamped to the valid range.
        let mut next_uncovered = 0usize;
        for p in occurrences(&chars, &term_chars) {
            let lo = (p + term_chars.len()).saturating_sub(window).max(next_uncovered);
            let hi = p.min(starts - 1);
            if lo > hi {
                continue;
            }
            coverage[lo] += 1;
            coverage[hi + 1] -= 1;
            next_uncovered = hi + 1;
        }
    }

    let mut best = 0i32;
    let mut running = 0i32;
    for delta in &coverage[..starts] {
        running += delta;
        best = best.max(running);
    }

    best as f64 / terms.len() as f64
}

/// Character positions where `needle` occurs in `haystack`, ascending.
fn occurrences(haystack: &[char], needle: &[char]) -> Vec<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return Vec::new();
    }
    (0..=haystack.len() - needle.len())
        .filter(|&i| haystack[i..i + needle.len()] == *needle)
        .collect()
}

/// Multiplier for question-starter queries; 1.0 when no starter
/// matches.
pub fn boost(query: &str) -> f64 {
    let lowered = query.trim_start().to_lowercase();
    BOOSTS
        .iter()
        .find(|(word, _)| lowered.starts_with(word))
        .map(|(_, multiplier)| *multiplier)
        .unwrap_or(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_terms_lowercase_and_length_filter() {
        assert_eq!(
            query_terms("What IS an Osmosis-Gradient?"),
            vec!["what", "osmosis", "gradient"]
        );
        // "is", "an" are too short; punctuation splits
        assert_eq!(query_terms("a an it"), Vec::<String>::new());
    }

    #[test]
    fn test_score_zero_without_terms() {
        assert_eq!(score("any text at all", "a b"), 0.0);
        assert_eq!(score("any text at all", ""), 0.0);
    }

    #[test]
    fn test_term_frequency_monotonic() {
        let one = score("the mitochondria is here", "mitochondria");
        let three = score(
            "mitochondria mitochondria mitochondria",
            "mitochondria",
        );
        assert!(three > one);
        assert!(one > 0.0);
    }

    #[test]
    fn test_context_rewards_terms_in_same_window() {
        let query = "osmosis diffusion";
        let apart = format!("osmosis{}diffusion", " filler ".repeat(40));
        let together = "osmosis and diffusion move molecules";

        let apart_score = score(&apart, query);
        let together_score = score(together, query);
        assert!(together_score > apart_score);
    }

    #[test]
    fn test_context_score_short_text_single_window() {
        // Text shorter than the window: one window spans everything.
        let terms = vec!["cell".to_string(), "wall".to_string()];
        assert_eq!(context_score("the cell has a wall", &terms), 1.0);
        assert_eq!(context_score("the cell divides", &terms), 0.5);
    }

    #[test]
    fn test_context_score_counts_distinct_not_repeats() {
        let terms = vec!["cell".to_string(), "wall".to_string()];
        // Repeating one term does not raise the distinct count.
        assert_eq!(context_score("cell cell cell cell", &terms), 0.5);
    }

    #[test]
    fn test_boost_table() {
        assert_eq!(boost("explain the theory"), 1.3);
        assert_eq!(boost("what is x"), 1.2);
        assert_eq!(boost("Analyze the results"), 1.4);
        assert_eq!(boost("tell me about x"), 1.0);
    }

    #[test]
    fn test_boost_first_match_wins_in_order() {
        // "whatever" matches the "what" prefix before anything else.
        assert_eq!(boost("whatever happened"), 1.2);
    }

    #[test]
    fn test_boost_applied_to_score() {
        // Same term structure (one absent word, one present word), so
        // the base score matches and only the starter multiplier
        // differs: 1.3 vs 1.0.
        let text = "photosynthesis in plants";
        let boosted = score(text, "explain photosynthesis");
        let plain = score(text, "detail photosynthesis");
        assert!(boosted > plain);
        assert!((boosted - plain * 1.3).abs() < 1e-9);
    }

    #[test]
    fn test_score_deterministic() {
        let text = "membranes regulate osmosis across the cell";
        let query = "how does osmosis work";
        assert_eq!(score(text, query), score(text, query));
    }

    #[test]
    fn test_occurrences_positions() {
        let hay: Vec<char> = "abcabc".chars().collect();
        let needle: Vec<char> = "abc".chars().collect();
        assert_eq!(occurrences(&hay, &needle), vec![0, 3]);
        assert_eq!(occurrences(&hay, &"zz".chars().collect::<Vec<_>>()), Vec::<usize>::new());
    }
}
