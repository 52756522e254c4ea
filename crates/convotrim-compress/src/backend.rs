//! External summarization capability

use crate::error::SummarizationError;
use crate::types::SummaryRequest;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Something that can condense text on request
#[async_trait]
pub trait SummaryBackend: Send + Sync {
    async fn summarize(&self, request: &SummaryRequest) -> Result<String, SummarizationError>;
}

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Summarization service reached via HTTP POST
#[derive(Debug, Clone)]
pub struct HttpSummaryBackend {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSummaryBackend {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, SummarizationError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SummaryBackend for HttpSummaryBackend {
    async fn summarize(&self, request: &SummaryRequest) -> Result<String, SummarizationError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(SummarizationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: SummaryResponse = serde_json::from_str(&body)
            .map_err(|e| SummarizationError::Malformed(e.to_string()))?;

        if let Some(error) = parsed.error {
            return Err(SummarizationError::Remote(error));
        }

        match parsed.summary {
            Some(summary) if !summary.trim().is_empty() => Ok(summary),
            Some(_) => Err(SummarizationError::Malformed("empty summary".to_string())),
            None => Err(SummarizationError::Malformed(
                "missing `summary` field".to_string(),
            )),
        }
    }
}

/// Backend used when no endpoint is configured; every call fails
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredBackend;

#[async_trait]
impl SummaryBackend for UnconfiguredBackend {
    async fn summarize(&self, _request: &SummaryRequest) -> Result<String, SummarizationError> {
        Err(SummarizationError::NotConfigured)
    }
}
