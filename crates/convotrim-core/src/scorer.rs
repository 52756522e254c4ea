//! Heuristic importance scoring for chat messages

use crate::types::{Message, Role};

const LENGTH_UNIT: f64 = 100.0;
const MAX_LENGTH_SCORE: f64 = 5.0;
const QUESTION_WEIGHT: f64 = 3.0;
const PROBLEM_WEIGHT: f64 = 4.0;
const IMPORTANCE_WEIGHT: f64 = 2.0;
const EDUCATIONAL_WEIGHT: f64 = 1.5;
const USER_WEIGHT: f64 = 1.0;
const LONG_ANSWER_WEIGHT: f64 = 2.0;
const LONG_ANSWER_CHARS: usize = 200;
const FILES_WEIGHT: f64 = 3.0;

const PROBLEM_KEYWORDS: &[&str] = &[
    "error",
    "problem",
    "issue",
    "bug",
    "fail",
    "wrong",
    "broken",
    "exception",
    "crash",
];

const IMPORTANCE_KEYWORDS: &[&str] = &[
    "important",
    "remember",
    "summary",
    "conclusion",
    "result",
    "solution",
    "explanation",
    "because",
    "therefore",
];

const EDUCATIONAL_KEYWORDS: &[&str] = &[
    "learn",
    "concept",
    "theory",
    "formula",
    "definition",
    "example",
    "step",
    "method",
];

/// Score how much a message is worth keeping when the window is trimmed
pub fn score(message: &Message) -> f64 {
    let Some(msg) = message.as_real() else {
        return 0.0;
    };

    let text = msg.text.to_lowercase();
    let length = msg.text.chars().count();
    let mut total = (length as f64 / LENGTH_UNIT).min(MAX_LENGTH_SCORE);

    if text.contains('?') {
        total += QUESTION_WEIGHT;
    }
    if PROBLEM_KEYWORDS.iter().any(|kw| text.contains(kw)) {
        total += PROBLEM_WEIGHT;
    }
    total += IMPORTANCE_WEIGHT * keyword_hits(&text, IMPORTANCE_KEYWORDS) as f64;
    total += EDUCATIONAL_WEIGHT * keyword_hits(&text, EDUCATIONAL_KEYWORDS) as f64;

    match msg.role {
        Role::User => total += USER_WEIGHT,
        Role::Model if length > LONG_ANSWER_CHARS => total += LONG_ANSWER_WEIGHT,
        _ => {}
    }

    if msg.file_count() > 0 {
        total += FILES_WEIGHT;
    }

    total
}

fn keyword_hits(text: &str, keywords: &[&str]) -> usize {
    keywords.iter().filter(|kw| text.contains(*kw)).count()
}
