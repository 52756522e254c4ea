//! Core types, scoring and query inspection for conversation optimization

mod config;
mod error;
pub mod inspector;
pub mod scorer;
mod tokens;
mod types;

pub use config::{
    CompressionConfig, LinkedConfig, OptimizerConfig, RelevanceConfig, SummaryConfig,
    SUMMARY_URL_ENV,
};
pub use error::{json_type_name, ConfigError, ValidationError};
pub use inspector::inspect;
pub use tokens::{estimate_message_tokens, estimate_tokens};
pub use types::{
    total_text_length, Analysis, ChatMessage, DetailLevel, FileRef, LinkedContext, Message,
    Method, Role, Strategy,
};
