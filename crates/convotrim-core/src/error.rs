//! Error types shared across the workspace

use std::path::PathBuf;
use thiserror::Error;

/// Malformed optimizer input. The only error that aborts an optimization.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("`messages` must be a list, got {found}")]
    NotAList { found: &'static str },

    #[error("message {index} is invalid: {reason}")]
    InvalidMessage { index: usize, reason: String },

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Name of a JSON value's type, for error messages
pub fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "a list",
        serde_json::Value::Object(_) => "an object",
    }
}
