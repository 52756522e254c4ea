//! Configuration for context optimization

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable overriding the summarization endpoint
pub const SUMMARY_URL_ENV: &str = "CONVOTRIM_SUMMARY_URL";

/// Head/tail compression settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    /// Leading messages always kept
    pub keep_first: usize,
    /// Trailing messages always kept
    pub keep_last: usize,
    /// Middle messages rescued by importance
    pub max_important: usize,
    /// Compression only kicks in above this many messages
    pub threshold: usize,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            keep_first: 2,
            keep_last: 10,
            max_important: 3,
            threshold: 20,
        }
    }
}

/// Summarization sub-call settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    /// Summarization capability URL (POST)
    pub endpoint: Option<String>,
    /// Summaries are only requested above this many characters
    pub char_threshold: usize,
    /// Leading messages kept verbatim around the summary
    pub head: usize,
    /// Trailing messages kept verbatim around the summary
    pub tail: usize,
    /// Per-message character cap when serializing the middle slice
    pub max_line_chars: usize,
    /// Max cached summaries
    pub cache_capacity: usize,
    /// Total attempts against the capability
    pub max_attempts: u32,
    /// Backoff unit; attempt n waits n * base
    pub base_delay_ms: u64,
    /// Per-request timeout
    pub request_timeout_secs: u64,
}

impl SummaryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            char_threshold: 4000,
            head: 2,
            tail: 5,
            max_line_chars: 1000,
            cache_capacity: 100,
            max_attempts: 2,
            base_delay_ms: 1000,
            request_timeout_secs: 30,
        }
    }
}

/// Chunk relevance ranking settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelevanceConfig {
    /// Most recent messages kept verbatim
    pub recent: usize,
    /// Leading messages kept verbatim
    pub head: usize,
    /// Upper bound on tokens per chunk
    pub max_chunk_tokens: usize,
    /// Token budget for the whole context window
    pub total_token_budget: usize,
    /// Share of the total budget available to retrieved chunks
    pub budget_fraction: f64,
    /// Chunks must score strictly above this to be included
    pub threshold: f64,
    /// Messages newer than this count as recent
    pub recency_window_secs: i64,
    /// Relevance bonus for recent chunks
    pub recency_bonus: f64,
}

impl Default for RelevanceConfig {
    fn default() -> Self {
        Self {
            recent: 10,
            head: 2,
            max_chunk_tokens: 4000,
            total_token_budget: 8000,
            budget_fraction: 0.6,
            threshold: 0.7,
            recency_window_secs: 60,
            recency_bonus: 0.2,
        }
    }
}

/// Linked conversation trimming settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkedConfig {
    pub max_contexts: usize,
    pub recent: usize,
    pub max_important: usize,
    pub max_messages: usize,
}

impl Default for LinkedConfig {
    fn default() -> Self {
        Self {
            max_contexts: 2,
            recent: 5,
            max_important: 2,
            max_messages: 5,
        }
    }
}

/// Optimizer configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub compression: CompressionConfig,
    pub summary: SummaryConfig,
    pub relevance: RelevanceConfig,
    pub linked: LinkedConfig,
}

impl OptimizerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a JSON file, then apply environment overrides
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self =
            serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(SUMMARY_URL_ENV) {
            if !url.trim().is_empty() {
                self.summary.endpoint = Some(url);
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.summary.cache_capacity == 0 {
            return Err(ConfigError::Invalid(
                "summary.cache_capacity must be at least 1".to_string(),
            ));
        }
        if self.summary.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "summary.max_attempts must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.relevance.budget_fraction) {
            return Err(ConfigError::Invalid(format!(
                "relevance.budget_fraction must be within [0, 1], got {}",
                self.relevance.budget_fraction
            )));
        }
        if self.relevance.max_chunk_tokens == 0 {
            return Err(ConfigError::Invalid(
                "relevance.max_chunk_tokens must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
