//! Keyword extraction for relevance matching

use regex::Regex;
use std::collections::{BTreeSet, HashSet};
use std::sync::OnceLock;

static WORD_RE: OnceLock<Regex> = OnceLock::new();

static STOP_WORDS: &[&str] = &[
    "the", "and", "are", "was", "were", "been", "being", "have", "has", "had", "does", "did",
    "will", "would", "could", "should", "may", "might", "can", "for", "with", "from", "into",
    "through", "then", "here", "there", "when", "where", "why", "how", "all", "each", "every",
    "both", "few", "more", "most", "some", "such", "not", "only", "just", "but", "about", "what",
    "which", "who", "this", "that", "these", "those", "its", "our", "you", "your", "yours",
    "they", "them", "their", "she", "her", "his", "him", "very", "too", "than", "please", "also",
    "now", "still", "already", "yes", "okay", "thanks", "thank", "let", "tell", "give", "any",
];

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    let re = WORD_RE.get_or_init(|| Regex::new(r"[\p{L}\p{N}_]{3,}").unwrap());
    re.find_iter(text).map(|m| m.as_str().to_lowercase())
}

/// Distinct significant words of a query, in sorted order
pub fn query_tokens(query: &str) -> Vec<String> {
    let stop: HashSet<&str> = STOP_WORDS.iter().copied().collect();
    words(query)
        .filter(|w| !stop.contains(w.as_str()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Every word of a text, lowercased, for membership checks
pub fn word_set(text: &str) -> HashSet<String> {
    words(text).collect()
}
