use chrono::{DateTime, Utc};
use convotrim_core::{DetailLevel, Message};
use serde::{Deserialize, Serialize};

/// Output of head/tail compression
#[derive(Debug, Clone)]
pub struct CompressionOutcome {
    pub messages: Vec<Message>,
    pub was_compressed: bool,
    pub ratio: f64,
}

/// Output of a summarization pass
#[derive(Debug, Clone)]
pub struct SummaryOutcome {
    pub messages: Vec<Message>,
    pub was_summarized: bool,
    pub ratio: f64,
    pub cache_hit: bool,
}

/// Cache key identifying a message slice by count and boundary timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    pub message_count: usize,
    pub first_timestamp: Option<DateTime<Utc>>,
    pub last_timestamp: Option<DateTime<Utc>>,
}

impl Fingerprint {
    pub fn of(messages: &[Message]) -> Self {
        Self {
            message_count: messages.len(),
            first_timestamp: messages.iter().find_map(Message::timestamp),
            last_timestamp: messages.iter().rev().find_map(Message::timestamp),
        }
    }
}

/// Body sent to the summarization capability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRequest {
    pub text: String,
    pub target_reduction: f64,
    pub max_length: usize,
    pub detail_level: DetailLevel,
    pub instructions: String,
}

/// Fraction of input removed, 0 for empty input
pub fn reduction_ratio(original: usize, result: usize) -> f64 {
    if original == 0 {
        return 0.0;
    }
    (original as f64 - result as f64) / original as f64
}
