//! AI-backed condensation of the middle of a conversation

use crate::backend::{HttpSummaryBackend, SummaryBackend, UnconfiguredBackend};
use crate::cache::SummaryCache;
use crate::error::SummarizationError;
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::types::{reduction_ratio, Fingerprint, SummaryOutcome, SummaryRequest};
use convotrim_core::{total_text_length, DetailLevel, Message, SummaryConfig};
use std::sync::Arc;

const DETAILED_LENGTH_FACTOR: f64 = 1.5;

const CONCISE_INSTRUCTIONS: &str = "Summarize this conversation excerpt concisely. \
     Keep decisions, open questions, facts the user shared and any errors discussed. \
     Drop greetings and filler.";

const DETAILED_INSTRUCTIONS: &str = "Summarize this conversation excerpt in detail. \
     Preserve technical specifics, examples, formulas, code identifiers and the reasoning \
     behind each conclusion, in the order they came up.";

/// Replaces the middle of a long conversation with one summary entry
pub struct Summarizer {
    backend: Arc<dyn SummaryBackend>,
    cache: SummaryCache,
    config: SummaryConfig,
    retry: RetryPolicy,
}

impl Summarizer {
    pub fn new(config: SummaryConfig, backend: Arc<dyn SummaryBackend>) -> Self {
        let cache = SummaryCache::new(config.cache_capacity);
        let retry = RetryPolicy::new(config.max_attempts, config.base_delay());
        Self {
            backend,
            cache,
            config,
            retry,
        }
    }

    /// Build a summarizer talking to the configured endpoint, if any
    pub fn from_config(config: SummaryConfig) -> Result<Self, SummarizationError> {
        let backend: Arc<dyn SummaryBackend> = match &config.endpoint {
            Some(endpoint) => Arc::new(HttpSummaryBackend::new(
                endpoint.clone(),
                config.request_timeout(),
            )?),
            None => {
                tracing::warn!("no summarization endpoint configured; summaries will degrade");
                Arc::new(UnconfiguredBackend)
            }
        };
        Ok(Self::new(config, backend))
    }

    /// Share an existing cache between summarizers
    pub fn with_cache(mut self, cache: SummaryCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn cache(&self) -> &SummaryCache {
        &self.cache
    }

    /// Whether `messages` carry enough text to be worth summarizing
    pub fn should_summarize(&self, messages: &[Message]) -> bool {
        total_text_length(messages) > self.config.char_threshold
    }

    /// Summarize everything between the kept head and tail.
    ///
    /// Inputs below the character threshold, or too short to have a middle,
    /// come back unchanged with `was_summarized == false`. A failed external
    /// call is returned as an error so the caller can fall back.
    pub async fn summarize(
        &self,
        messages: &[Message],
        detail: DetailLevel,
    ) -> Result<SummaryOutcome, SummarizationError> {
        let head_len = self.config.head;
        let tail_len = self.config.tail;

        if !self.should_summarize(messages) || messages.len() <= head_len + tail_len {
            return Ok(SummaryOutcome {
                messages: messages.to_vec(),
                was_summarized: false,
                ratio: 0.0,
                cache_hit: false,
            });
        }

        let original_chars = total_text_length(messages);
        let key = Fingerprint::of(messages);
        if let Some(cached) = self.cache.get(&key).await {
            tracing::debug!(count = key.message_count, "summary cache hit");
            let ratio = reduction_ratio(original_chars, total_text_length(&cached));
            return Ok(SummaryOutcome {
                messages: cached,
                was_summarized: true,
                ratio,
                cache_hit: true,
            });
        }

        let tail_start = messages.len() - tail_len;
        let head = &messages[..head_len];
        let middle = &messages[head_len..tail_start];
        let tail = &messages[tail_start..];

        let request = self.build_request(middle, detail);
        let backend = self.backend.as_ref();
        let request_ref = &request;
        let summary = retry_with_backoff(self.retry, move |_attempt| {
            backend.summarize(request_ref)
        })
        .await
        .map_err(|(attempts, last)| SummarizationError::Exhausted {
            attempts,
            last: Box::new(last),
        })?;

        let mut result = Vec::with_capacity(head.len() + 1 + tail.len());
        result.extend_from_slice(head);
        result.push(Message::SummaryMarker {
            original_count: middle.len(),
            text: summary,
        });
        result.extend_from_slice(tail);

        self.cache.insert(key, result.clone()).await;

        let ratio = reduction_ratio(original_chars, total_text_length(&result));
        tracing::info!(
            summarized = middle.len(),
            ?detail,
            ratio,
            "summarized conversation middle"
        );

        Ok(SummaryOutcome {
            messages: result,
            was_summarized: true,
            ratio,
            cache_hit: false,
        })
    }

    fn build_request(&self, middle: &[Message], detail: DetailLevel) -> SummaryRequest {
        let text = serialize_messages(middle, self.config.max_line_chars);
        let target_reduction = detail.target_reduction();
        let factor = match detail {
            DetailLevel::Detailed => DETAILED_LENGTH_FACTOR,
            DetailLevel::Concise => 1.0,
        };
        let max_length = (text.chars().count() as f64 * target_reduction * factor).floor() as usize;
        let instructions = match detail {
            DetailLevel::Concise => CONCISE_INSTRUCTIONS,
            DetailLevel::Detailed => DETAILED_INSTRUCTIONS,
        };

        SummaryRequest {
            text,
            target_reduction,
            max_length,
            detail_level: detail,
            instructions: instructions.to_string(),
        }
    }
}

/// Render messages as `"<Role>: <text>[ [Files: n]]"` blocks separated by blank lines
pub fn serialize_messages(messages: &[Message], max_chars: usize) -> String {
    messages
        .iter()
        .map(|m| {
            let text: String = m.rendered_text().chars().take(max_chars).collect();
            let files = m.file_count();
            if files > 0 {
                format!("{}: {} [Files: {}]", m.role(), text, files)
            } else {
                format!("{}: {}", m.role(), text)
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use convotrim_core::{ChatMessage, FileRef, Role};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct MockBackend {
        calls: AtomicUsize,
        fail_first: usize,
        requests: Mutex<Vec<SummaryRequest>>,
    }

    impl MockBackend {
        fn succeeding() -> Arc<Self> {
            Self::failing_first(0)
        }

        fn failing_first(n: usize) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail_first: n,
                requests: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SummaryBackend for MockBackend {
        async fn summarize(&self, request: &SummaryRequest) -> Result<String, SummarizationError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request.clone());
            if call < self.fail_first {
                Err(SummarizationError::Status {
                    status: 500,
                    body: "boom".to_string(),
                })
            } else {
                Ok("They covered borrowing and lifetimes.".to_string())
            }
        }
    }

    fn start() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn long_conversation(len: usize) -> Vec<Message> {
        (0..len)
            .map(|i| {
                let text = format!("turn {} {}", i, "lorem ipsum dolor sit amet ".repeat(20));
                Message::user(text, start() + Duration::seconds(i as i64))
            })
            .collect()
    }

    fn fast_config() -> SummaryConfig {
        SummaryConfig {
            base_delay_ms: 0,
            ..SummaryConfig::default()
        }
    }

    #[tokio::test]
    async fn test_short_input_unchanged() {
        let backend = MockBackend::succeeding();
        let summarizer = Summarizer::new(fast_config(), backend.clone());
        let messages = vec![
            Message::user("hi", start()),
            Message::model("hello", start() + Duration::seconds(1)),
        ];

        let outcome = summarizer.summarize(&messages, DetailLevel::Concise).await.unwrap();
        assert!(!outcome.was_summarized);
        assert_eq!(outcome.messages, messages);
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_keeps_head_and_tail() {
        let backend = MockBackend::succeeding();
        let summarizer = Summarizer::new(fast_config(), backend.clone());
        let messages = long_conversation(15);

        let outcome = summarizer.summarize(&messages, DetailLevel::Concise).await.unwrap();
        assert!(outcome.was_summarized);
        assert!(!outcome.cache_hit);
        assert_eq!(outcome.messages.len(), 2 + 1 + 5);
        assert_eq!(&outcome.messages[..2], &messages[..2]);
        assert_eq!(&outcome.messages[3..], &messages[10..]);
        assert_eq!(
            outcome.messages[2],
            Message::SummaryMarker {
                original_count: 8,
                text: "They covered borrowing and lifetimes.".to_string(),
            }
        );
        assert!(outcome.ratio > 0.0);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_backend() {
        let backend = MockBackend::succeeding();
        let summarizer = Summarizer::new(fast_config(), backend.clone());
        let messages = long_conversation(12);

        let first = summarizer.summarize(&messages, DetailLevel::Concise).await.unwrap();
        let second = summarizer.summarize(&messages, DetailLevel::Concise).await.unwrap();

        assert_eq!(backend.calls(), 1);
        assert!(second.cache_hit);
        assert_eq!(first.messages, second.messages);
    }

    #[tokio::test]
    async fn test_retries_then_succeeds() {
        let backend = MockBackend::failing_first(1);
        let summarizer = Summarizer::new(fast_config(), backend.clone());

        let outcome = summarizer
            .summarize(&long_conversation(12), DetailLevel::Concise)
            .await
            .unwrap();
        assert!(outcome.was_summarized);
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn test_exhausted_returns_error_and_caches_nothing() {
        let backend = MockBackend::failing_first(usize::MAX);
        let summarizer = Summarizer::new(fast_config(), backend.clone());

        let err = summarizer
            .summarize(&long_conversation(12), DetailLevel::Concise)
            .await
            .unwrap_err();
        assert!(matches!(err, SummarizationError::Exhausted { attempts: 2, .. }));
        assert_eq!(backend.calls(), 2);
        assert!(summarizer.cache().is_empty().await);
    }

    #[tokio::test]
    async fn test_detailed_request_shape() {
        let backend = MockBackend::succeeding();
        let summarizer = Summarizer::new(fast_config(), backend.clone());
        summarizer
            .summarize(&long_conversation(12), DetailLevel::Detailed)
            .await
            .unwrap();

        let requests = backend.requests.lock().unwrap();
        let request = &requests[0];
        assert_eq!(request.detail_level, DetailLevel::Detailed);
        assert_eq!(request.target_reduction, 0.40);
        let expected = (request.text.chars().count() as f64 * 0.40 * 1.5).floor() as usize;
        assert_eq!(request.max_length, expected);
        assert!(request.text.starts_with("User: turn 2 "));
    }

    #[test]
    fn test_serialize_truncates_and_counts_files() {
        let long = ChatMessage::new(Role::Model, "z".repeat(1500), start());
        let with_file = ChatMessage::new(Role::User, "see this", start()).with_files(vec![
            FileRef {
                name: "a.png".to_string(),
                mime_type: None,
                url: None,
            },
            FileRef {
                name: "b.png".to_string(),
                mime_type: None,
                url: None,
            },
        ]);

        let text = serialize_messages(&[long.into(), with_file.into()], 1000);
        let blocks: Vec<&str> = text.split("\n\n").collect();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].len(), "Model: ".len() + 1000);
        assert_eq!(blocks[1], "User: see this [Files: 2]");
    }
}
