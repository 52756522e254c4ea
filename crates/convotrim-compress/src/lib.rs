//! Context compression and LLM-based summarization

pub mod backend;
mod cache;
pub mod compressor;
mod error;
pub mod retry;
mod summarizer;
mod types;

pub use backend::{HttpSummaryBackend, SummaryBackend, UnconfiguredBackend};
pub use cache::SummaryCache;
pub use compressor::compress;
pub use error::SummarizationError;
pub use retry::{retry_with_backoff, RetryPolicy};
pub use summarizer::{serialize_messages, Summarizer};
pub use types::{CompressionOutcome, Fingerprint, SummaryOutcome, SummaryRequest};
