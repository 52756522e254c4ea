use thiserror::Error;

/// Failure of the external summarization capability. Always recoverable.
#[derive(Debug, Error)]
pub enum SummarizationError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("summarization service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("summarization service reported: {0}")]
    Remote(String),

    #[error("malformed summarization response: {0}")]
    Malformed(String),

    #[error("no summarization endpoint configured")]
    NotConfigured,

    #[error("summarization failed after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: Box<SummarizationError>,
    },
}

impl From<reqwest::Error> for SummarizationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SummarizationError::Malformed(err.to_string())
        } else {
            SummarizationError::Transport(err.to_string())
        }
    }
}
