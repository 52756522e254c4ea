//! Relevance ranking and semantic chunking of conversation history

mod chunker;
mod ranker;
mod tokenize;

pub use chunker::{chunk_messages, Chunk};
pub use ranker::{optimize_by_relevance, RelevanceDiagnostics, RelevanceOutcome, RelevanceRanker};
pub use tokenize::{query_tokens, word_set};
