#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use convotrim::ContextOptimizer;
use convotrim_compress::{SummarizationError, SummaryBackend, SummaryRequest, Summarizer};
use convotrim_core::{LinkedContext, Message, OptimizerConfig};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub fn at(minute: usize) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::minutes(minute as i64)
}

/// Short messages with no scoring keywords
pub fn short_history(n: usize) -> Vec<Message> {
    (0..n)
        .map(|i| {
            if i % 2 == 0 {
                Message::user(format!("note {}", i), at(i))
            } else {
                Message::model(format!("ack {}", i), at(i))
            }
        })
        .collect()
}

/// Messages long enough that compressed output crosses the summary threshold
pub fn long_history(n: usize) -> Vec<Message> {
    (0..n)
        .map(|i| {
            let body = format!("turn {} discussing the deployment plan in depth. ", i).repeat(12);
            Message::user(body, at(i))
        })
        .collect()
}

pub fn linked(chat_id: &str, texts: &[&str]) -> LinkedContext {
    LinkedContext {
        chat_id: chat_id.to_string(),
        subject: format!("{} notes", chat_id),
        messages: texts
            .iter()
            .enumerate()
            .map(|(i, t)| Message::user(*t, at(i)))
            .collect(),
    }
}

/// Config with retries that do not sleep
pub fn fast_config() -> OptimizerConfig {
    let mut config = OptimizerConfig::new();
    config.summary.base_delay_ms = 0;
    config
}

/// Backend returning a fixed summary, or failing every call
pub struct CountingBackend {
    pub calls: AtomicUsize,
    pub fail: bool,
}

impl CountingBackend {
    pub fn ok() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail: false,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail: true,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SummaryBackend for CountingBackend {
    async fn summarize(&self, _request: &SummaryRequest) -> Result<String, SummarizationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(SummarizationError::Remote("backend down".to_string()))
        } else {
            Ok("The team agreed on a staged rollout.".to_string())
        }
    }
}

pub fn optimizer_with(backend: Arc<CountingBackend>) -> ContextOptimizer {
    optimizer_with_config(fast_config(), backend)
}

pub fn optimizer_with_config(
    config: OptimizerConfig,
    backend: Arc<CountingBackend>,
) -> ContextOptimizer {
    let summarizer = Summarizer::new(config.summary.clone(), backend);
    ContextOptimizer::with_summarizer(config, summarizer)
}
