//! Query-relevance selection of older conversation chunks

use crate::chunker::{chunk_messages, Chunk};
use crate::tokenize::{query_tokens, word_set};
use chrono::{DateTime, Duration, Utc};
use convotrim_core::{estimate_message_tokens, Message, Method, RelevanceConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

const DEDUP_PREFIX_CHARS: usize = 50;

/// What the ranker looked at and kept
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelevanceDiagnostics {
    pub chunk_count: usize,
    pub selected_chunks: usize,
    /// Tokens available to chunks after reserving head and tail
    pub token_budget: i64,
    pub tokens_used: usize,
}

#[derive(Debug, Clone)]
pub struct RelevanceOutcome {
    pub messages: Vec<Message>,
    pub method: Method,
    pub diagnostics: RelevanceDiagnostics,
}

/// Picks the older chunks most relevant to the query under a token budget
#[derive(Debug, Clone, Default)]
pub struct RelevanceRanker {
    config: RelevanceConfig,
}

impl RelevanceRanker {
    pub fn new(config: RelevanceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RelevanceConfig {
        &self.config
    }

    pub fn optimize(&self, messages: &[Message], query: &str) -> RelevanceOutcome {
        self.optimize_at(messages, query, Utc::now())
    }

    /// Same as [`optimize`](Self::optimize) with an explicit clock for recency
    pub fn optimize_at(
        &self,
        messages: &[Message],
        query: &str,
        now: DateTime<Utc>,
    ) -> RelevanceOutcome {
        let config = &self.config;
        let total = messages.len();
        if total <= config.head + config.recent {
            return RelevanceOutcome {
                messages: messages.to_vec(),
                method: Method::None,
                diagnostics: RelevanceDiagnostics::default(),
            };
        }

        let tail_start = total - config.recent;
        let head = &messages[..config.head];
        let older = &messages[config.head..tail_start];
        let tail = &messages[tail_start..];

        let keywords = query_tokens(query);
        let mut chunks = chunk_messages(older, config.max_chunk_tokens);
        for chunk in &mut chunks {
            chunk.relevance = self.score_chunk(chunk, &keywords, now);
        }

        // Most relevant first, newer chunks win ties
        chunks.sort_by(|a, b| {
            b.relevance
                .partial_cmp(&a.relevance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.last_timestamp.cmp(&a.last_timestamp))
        });

        let reserved = estimate_message_tokens(head) + estimate_message_tokens(tail);
        let token_budget = (config.total_token_budget as f64 * config.budget_fraction).floor()
            as i64
            - reserved as i64;

        let mut remaining = token_budget;
        let mut selected: Vec<&Chunk> = Vec::new();
        for chunk in &chunks {
            if chunk.relevance <= config.threshold {
                break;
            }
            if remaining - (chunk.tokens as i64) < 0 {
                continue;
            }
            remaining -= chunk.tokens as i64;
            selected.push(chunk);
        }
        selected.sort_by_key(|c| c.start);

        let mut combined: Vec<Message> = Vec::with_capacity(total);
        combined.extend_from_slice(head);
        for chunk in &selected {
            combined.extend(chunk.messages.iter().cloned());
        }
        combined.extend_from_slice(tail);
        let result = dedup_messages(combined);

        let diagnostics = RelevanceDiagnostics {
            chunk_count: chunks.len(),
            selected_chunks: selected.len(),
            token_budget,
            tokens_used: (token_budget - remaining).max(0) as usize,
        };
        let method = if result.len() < total {
            Method::SemanticOptimization
        } else {
            Method::None
        };

        tracing::debug!(
            chunks = diagnostics.chunk_count,
            selected = diagnostics.selected_chunks,
            budget = diagnostics.token_budget,
            kept = result.len(),
            total,
            "relevance selection"
        );

        RelevanceOutcome {
            messages: result,
            method,
            diagnostics,
        }
    }

    /// Share of query keywords present in the chunk, plus a recency bonus, capped at 1
    pub fn score_chunk(&self, chunk: &Chunk, keywords: &[String], now: DateTime<Utc>) -> f64 {
        let keyword_score = if keywords.is_empty() {
            0.0
        } else {
            let words = word_set(&chunk.text());
            let matched = keywords.iter().filter(|k| words.contains(*k)).count();
            matched as f64 / keywords.len() as f64
        };

        let window = Duration::seconds(self.config.recency_window_secs);
        let recent = chunk
            .messages
            .iter()
            .filter_map(Message::timestamp)
            .any(|ts| now.signed_duration_since(ts) <= window);
        let bonus = if recent { self.config.recency_bonus } else { 0.0 };

        (keyword_score + bonus).min(1.0)
    }
}

/// Rank older messages against `query`, reserving `budget_fraction` of the token budget
pub fn optimize_by_relevance(
    messages: &[Message],
    query: &str,
    budget_fraction: f64,
) -> RelevanceOutcome {
    let config = RelevanceConfig {
        budget_fraction,
        ..RelevanceConfig::default()
    };
    RelevanceRanker::new(config).optimize(messages, query)
}

/// Drop repeated real messages by (timestamp, text prefix), keeping first
/// occurrences in order. Markers carry no timestamp and are always kept.
fn dedup_messages(messages: Vec<Message>) -> Vec<Message> {
    let mut seen: HashSet<(DateTime<Utc>, String)> = HashSet::new();
    messages
        .into_iter()
        .filter(|m| {
            let Some(real) = m.as_real() else {
                return true;
            };
            let prefix: String = real.text.chars().take(DEDUP_PREFIX_CHARS).collect();
            seen.insert((real.timestamp, prefix))
        })
        .collect()
}
