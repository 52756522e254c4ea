//! Token estimation utilities

use crate::types::Message;

const TOKENS_PER_WORD: f64 = 1.3;

/// Estimate token count from text
///
/// Uses a word-count heuristic (~1.3 tokens per whitespace-separated word).
/// Every budget in the workspace is computed with this one formula.
pub fn estimate_tokens(text: &str) -> usize {
    let words = text.split_whitespace().count();
    if words == 0 {
        return 0;
    }
    (words as f64 * TOKENS_PER_WORD).ceil() as usize
}

/// Estimate tokens for the rendered form of each message
pub fn estimate_message_tokens(messages: &[Message]) -> usize {
    messages
        .iter()
        .map(|m| estimate_tokens(&m.rendered_text()))
        .sum()
}
