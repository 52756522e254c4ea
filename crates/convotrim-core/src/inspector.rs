//! Query inspection: how does the new prompt refer back to the conversation?

use crate::types::{Analysis, DetailLevel, Message, Strategy};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

const DEFAULT_WINDOW: usize = 10;
const FULL_CONVERSATION_WINDOW: usize = 25;
const BROAD_CONTEXT_WINDOW: usize = 15;
const RECENT_REFERENCE_SPAN: usize = 2;
const EARLIER_REFERENCE_SPAN: usize = 5;

const ORDINALS: &[&str] = &[
    "first", "second", "third", "fourth", "fifth", "sixth", "seventh", "eighth", "ninth", "tenth",
];

/// Pattern families, listed in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    MessageReference,
    FullConversation,
    BroadContext,
}

struct Pattern {
    family: Family,
    regex: Regex,
}

const PATTERN_TABLE: &[(Family, &str)] = &[
    (
        Family::MessageReference,
        r"\b(first|second|third|fourth|fifth|sixth|seventh|eighth|ninth|tenth)\s+(message|response|reply|answer|question|prompt)\b",
    ),
    (
        Family::MessageReference,
        r"\b(message|msg|response|reply)\s*(number\s*|no\.?\s*|#\s*)?\d+\b",
    ),
    (
        Family::MessageReference,
        r"\b(previous|last)\s+(message|response|reply|answer|question|prompt)\b",
    ),
    (
        Family::MessageReference,
        r"\b(mentioned|said|discussed|stated|wrote|explained)\s+(above|earlier|before)\b",
    ),
    (
        Family::MessageReference,
        r"\b(above|earlier)\s+(message|messages|response|responses|answer|reply)\b",
    ),
    (
        Family::MessageReference,
        r"\bas\s+(mentioned|said|discussed)\s+in\b",
    ),
    (
        Family::FullConversation,
        r"\b(entire|whole|full|complete)\s+(conversation|chat|discussion|thread|history)\b",
    ),
    (
        Family::FullConversation,
        r"\bsummari[sz]e\s+(everything|it\s+all|all\s+of\s+(this|it)|our\s+(chat|conversation|discussion))\b",
    ),
    (
        Family::FullConversation,
        r"\b(everything|all)\s+we('ve|\s+have)?\s+(discussed|talked\s+about|covered)\b",
    ),
    (
        Family::FullConversation,
        r"\bfrom\s+the\s+(very\s+)?(beginning|start)\b",
    ),
    (
        Family::BroadContext,
        r"\b(overall|comprehensive|comprehensively|big\s+picture|in\s+depth|in\s+detail|thorough|holistic)\b",
    ),
];

static PATTERNS: OnceLock<Vec<Pattern>> = OnceLock::new();
static ORDINAL_RE: OnceLock<Regex> = OnceLock::new();
static NUMERAL_RE: OnceLock<Regex> = OnceLock::new();
static RECENT_RE: OnceLock<Regex> = OnceLock::new();
static EARLIER_RE: OnceLock<Regex> = OnceLock::new();

fn patterns() -> &'static [Pattern] {
    PATTERNS.get_or_init(|| {
        PATTERN_TABLE
            .iter()
            .map(|(family, source)| Pattern {
                family: *family,
                regex: case_insensitive(source),
            })
            .collect()
    })
}

fn case_insensitive(source: &str) -> Regex {
    Regex::new(&format!("(?i){}", source)).expect("built-in pattern must compile")
}

/// Classify a user query against the conversation history
///
/// Pure and deterministic. Unknown queries fall back to a normal recent
/// window with concise summaries.
pub fn inspect(user_query: &str, history: &[Message]) -> Analysis {
    let history_len = history.len();

    let mut reference = false;
    let mut full = false;
    let mut broad = false;
    for pattern in patterns() {
        if !pattern.regex.is_match(user_query) {
            continue;
        }
        match pattern.family {
            Family::MessageReference => reference = true,
            Family::FullConversation => full = true,
            Family::BroadContext => broad = true,
        }
    }

    let mut analysis = Analysis::default();

    if reference {
        analysis.strategy = Strategy::SpecificMessages;
        analysis.referenced_indices = resolve_references(user_query, history_len);
    } else if full {
        analysis.strategy = Strategy::FullConversation;
        analysis.recommended_window_size = history_len.min(FULL_CONVERSATION_WINDOW);
        analysis.summary_detail = DetailLevel::Detailed;
    }

    if broad {
        analysis.summary_detail = DetailLevel::Detailed;
        analysis.recommended_window_size = analysis.recommended_window_size.max(BROAD_CONTEXT_WINDOW);
    }

    tracing::debug!(
        strategy = ?analysis.strategy,
        referenced = analysis.referenced_indices.len(),
        window = analysis.recommended_window_size,
        detail = ?analysis.summary_detail,
        "inspected query"
    );

    analysis
}

/// Resolve ordinal, relative and numeric references to history indices
fn resolve_references(query: &str, history_len: usize) -> Vec<usize> {
    let mut indices = BTreeSet::new();
    if history_len == 0 {
        return Vec::new();
    }

    let ordinal_re = ORDINAL_RE.get_or_init(|| {
        case_insensitive(
            r"\b(first|second|third|fourth|fifth|sixth|seventh|eighth|ninth|tenth)\s+(?:message|response|reply|answer|question|prompt)\b",
        )
    });
    for cap in ordinal_re.captures_iter(query) {
        let word = cap[1].to_lowercase();
        if let Some(index) = ORDINALS.iter().position(|o| *o == word) {
            if index < history_len {
                indices.insert(index);
            }
        }
    }

    let recent_re = RECENT_RE.get_or_init(|| {
        case_insensitive(r"\b(?:last|previous)\s+(?:message|response|reply|answer|question|prompt)\b")
    });
    if recent_re.is_match(query) {
        indices.extend(history_len.saturating_sub(RECENT_REFERENCE_SPAN)..history_len);
    }

    let earlier_re = EARLIER_RE.get_or_init(|| {
        case_insensitive(
            r"\b(?:mentioned|said|discussed|stated|wrote|explained)\s+(?:above|earlier|before)\b|\b(?:above|earlier)\s+(?:messages?|responses?|answer|reply)\b",
        )
    });
    if earlier_re.is_match(query) {
        indices.extend(history_len.saturating_sub(EARLIER_REFERENCE_SPAN)..history_len);
    }

    let numeral_re = NUMERAL_RE.get_or_init(|| {
        case_insensitive(r"\b(?:message|msg|response|reply)\s*(?:number\s*|no\.?\s*|#\s*)?(\d+)\b")
    });
    for cap in numeral_re.captures_iter(query) {
        let Ok(number) = cap[1].parse::<usize>() else {
            continue;
        };
        if (1..=history_len).contains(&number) {
            indices.insert(number - 1);
        }
    }

    indices.into_iter().collect()
}
