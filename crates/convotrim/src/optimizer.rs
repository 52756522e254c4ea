//! End-to-end context optimization pipeline

use crate::linked::optimize_linked;
use convotrim_compress::{compress, SummarizationError, Summarizer};
use convotrim_core::{
    estimate_message_tokens, inspect, json_type_name, total_text_length, Analysis, LinkedContext,
    Message, Method, OptimizerConfig, Strategy, ValidationError,
};
use convotrim_index::{RelevanceDiagnostics, RelevanceRanker};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Messages always kept alongside explicitly referenced ones
const SPECIFIC_TAIL: usize = 5;
/// Window used when selection yields nothing
const FALLBACK_WINDOW: usize = 10;

/// How older history is selected
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    /// Inspector window, then head/tail compression and summarization
    #[default]
    HeadTail,
    /// Query-relevance chunk selection under a token budget
    Relevance,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizationRequest {
    pub messages: Vec<Message>,
    pub linked_contexts: Vec<LinkedContext>,
    pub user_query: Option<String>,
    pub selection: Selection,
}

/// Request fields other than `messages`, which is validated separately
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RequestOptions {
    linked_contexts: Vec<LinkedContext>,
    user_query: Option<String>,
    selection: Selection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Summarization was attempted and failed; compressed output was kept
    pub degraded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<Analysis>,
    pub original_count: usize,
    pub final_count: usize,
    pub estimated_tokens_before: usize,
    pub estimated_tokens_after: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compression_ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_ratio: Option<f64>,
    pub summary_cache_hit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevance: Option<RelevanceDiagnostics>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub messages: Vec<Message>,
    pub linked_contexts: Vec<LinkedContext>,
    pub optimized: bool,
    pub method: Method,
    pub diagnostics: Diagnostics,
}

/// Ties inspection, compression, summarization and linked-context trimming together.
///
/// One optimizer may serve many conversations at once; the summary cache is
/// the only state shared between calls.
pub struct ContextOptimizer {
    config: OptimizerConfig,
    summarizer: Summarizer,
    ranker: RelevanceRanker,
}

impl ContextOptimizer {
    /// Optimizer whose summarizer talks to the configured endpoint
    pub fn new(config: OptimizerConfig) -> Result<Self, SummarizationError> {
        let summarizer = Summarizer::from_config(config.summary.clone())?;
        Ok(Self::with_summarizer(config, summarizer))
    }

    pub fn with_summarizer(config: OptimizerConfig, summarizer: Summarizer) -> Self {
        let ranker = RelevanceRanker::new(config.relevance.clone());
        Self {
            config,
            summarizer,
            ranker,
        }
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn summarizer(&self) -> &Summarizer {
        &self.summarizer
    }

    /// Validate a raw JSON request, then optimize it.
    ///
    /// Fails only when `messages` is not a list or an entry is not a message.
    pub async fn optimize_value(
        &self,
        value: serde_json::Value,
    ) -> Result<OptimizationResult, ValidationError> {
        let request = parse_request(value)?;
        Ok(self.optimize(&request).await)
    }

    pub async fn optimize(&self, request: &OptimizationRequest) -> OptimizationResult {
        let messages = &request.messages;
        let query = request
            .user_query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty());
        let analysis = query.map(|q| inspect(q, messages));

        let mut diagnostics = Diagnostics {
            analysis: analysis.clone(),
            original_count: messages.len(),
            estimated_tokens_before: estimate_message_tokens(messages),
            ..Diagnostics::default()
        };

        let (final_messages, method) = match request.selection {
            Selection::HeadTail => {
                self.head_tail(messages, analysis.as_ref(), &mut diagnostics)
                    .await
            }
            Selection::Relevance => {
                let outcome = self.ranker.optimize(messages, query.unwrap_or_default());
                diagnostics.relevance = Some(outcome.diagnostics);
                (outcome.messages, outcome.method)
            }
        };

        let linked_contexts = optimize_linked(&request.linked_contexts, &self.config.linked);

        diagnostics.final_count = final_messages.len();
        diagnostics.estimated_tokens_after = estimate_message_tokens(&final_messages);

        tracing::info!(
            ?method,
            before = diagnostics.original_count,
            after = diagnostics.final_count,
            tokens_before = diagnostics.estimated_tokens_before,
            tokens_after = diagnostics.estimated_tokens_after,
            degraded = diagnostics.degraded,
            "optimized context"
        );

        OptimizationResult {
            messages: final_messages,
            linked_contexts,
            optimized: method != Method::None,
            method,
            diagnostics,
        }
    }

    async fn head_tail(
        &self,
        messages: &[Message],
        analysis: Option<&Analysis>,
        diagnostics: &mut Diagnostics,
    ) -> (Vec<Message>, Method) {
        let candidates = match analysis {
            Some(analysis) => select_candidates(messages, analysis),
            None => messages.to_vec(),
        };

        let compressed = compress(&candidates, &self.config.compression);
        if !compressed.was_compressed {
            return (compressed.messages, Method::None);
        }
        diagnostics.compression_ratio = Some(compressed.ratio);

        if total_text_length(&compressed.messages) <= self.config.summary.char_threshold {
            return (compressed.messages, Method::Compression);
        }

        let detail = analysis.map(|a| a.summary_detail).unwrap_or_default();
        match self.summarizer.summarize(&compressed.messages, detail).await {
            Ok(outcome) if outcome.was_summarized => {
                diagnostics.summary_ratio = Some(outcome.ratio);
                diagnostics.summary_cache_hit = outcome.cache_hit;
                (outcome.messages, Method::Hybrid)
            }
            Ok(_) => (compressed.messages, Method::Compression),
            Err(e) => {
                tracing::warn!(error = %e, "summarization failed, keeping compressed context");
                diagnostics.degraded = true;
                (compressed.messages, Method::Compression)
            }
        }
    }
}

/// Pick the messages the analysis points at, in chronological order
fn select_candidates(messages: &[Message], analysis: &Analysis) -> Vec<Message> {
    let len = messages.len();
    let window = analysis.recommended_window_size;

    let mut indices: BTreeSet<usize> = match analysis.strategy {
        Strategy::SpecificMessages => {
            let mut picked = BTreeSet::new();
            for &i in analysis.referenced_indices.iter().filter(|&&i| i < len) {
                picked.extend(i.saturating_sub(1)..=(i + 1).min(len - 1));
            }
            picked.extend(len.saturating_sub(SPECIFIC_TAIL)..len);
            picked
        }
        Strategy::FullConversation => (0..window.min(len)).collect(),
        Strategy::Normal => (len.saturating_sub(window)..len).collect(),
    };

    if indices.is_empty() {
        indices.extend(len.saturating_sub(FALLBACK_WINDOW)..len);
    }

    tracing::debug!(
        strategy = ?analysis.strategy,
        selected = indices.len(),
        total = len,
        "selected candidate messages"
    );
    indices.into_iter().map(|i| messages[i].clone()).collect()
}

fn parse_request(value: serde_json::Value) -> Result<OptimizationRequest, ValidationError> {
    let mut fields = match value {
        serde_json::Value::Object(fields) => fields,
        other => {
            return Err(ValidationError::InvalidRequest(format!(
                "expected an object, got {}",
                json_type_name(&other)
            )))
        }
    };

    let raw_messages = match fields.remove("messages") {
        Some(serde_json::Value::Array(items)) => items,
        Some(other) => {
            return Err(ValidationError::NotAList {
                found: json_type_name(&other),
            })
        }
        None => return Err(ValidationError::NotAList { found: "nothing" }),
    };

    let messages = raw_messages
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value::<Message>(item).map_err(|e| ValidationError::InvalidMessage {
                index,
                reason: e.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let options: RequestOptions = serde_json::from_value(serde_json::Value::Object(fields))
        .map_err(|e| ValidationError::InvalidRequest(e.to_string()))?;

    Ok(OptimizationRequest {
        messages,
        linked_contexts: options.linked_contexts,
        user_query: options.user_query,
        selection: options.selection,
    })
}
