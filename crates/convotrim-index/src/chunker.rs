//! Split older history into token-bounded chunks

use chrono::{DateTime, Utc};
use convotrim_core::{estimate_tokens, Message};

/// Consecutive messages scored as one unit
#[derive(Debug, Clone)]
pub struct Chunk {
    pub messages: Vec<Message>,
    pub relevance: f64,
    pub last_timestamp: Option<DateTime<Utc>>,
    /// Estimated tokens across the chunk
    pub tokens: usize,
    /// Position of the first message in the chunked slice
    pub start: usize,
}

impl Chunk {
    fn new(start: usize) -> Self {
        Self {
            messages: Vec::new(),
            relevance: 0.0,
            last_timestamp: None,
            tokens: 0,
            start,
        }
    }

    fn push(&mut self, message: Message, tokens: usize) {
        if let Some(ts) = message.timestamp() {
            self.last_timestamp = Some(ts);
        }
        self.tokens += tokens;
        self.messages.push(message);
    }

    pub fn text(&self) -> String {
        self.messages
            .iter()
            .map(Message::rendered_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Greedily pack messages into chunks of at most `max_tokens` tokens.
///
/// A message larger than the limit on its own becomes a single-message chunk.
pub fn chunk_messages(messages: &[Message], max_tokens: usize) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut current = Chunk::new(0);

    for (i, message) in messages.iter().enumerate() {
        let tokens = estimate_tokens(&message.rendered_text());
        if !current.messages.is_empty() && current.tokens + tokens > max_tokens {
            chunks.push(std::mem::replace(&mut current, Chunk::new(i)));
        }
        current.push(message.clone(), tokens);
    }

    if !current.messages.is_empty() {
        chunks.push(current);
    }
    chunks
}
