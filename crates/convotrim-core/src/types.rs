//! Core types for conversation optimization

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
    System,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Role::User => "User",
            Role::Model => "Model",
            Role::System => "System",
        };
        f.write_str(label)
    }
}

/// Attachment reference carried by a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A message actually exchanged in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<FileRef>>,
}

impl ChatMessage {
    pub fn new(role: Role, text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp,
            files: None,
        }
    }

    pub fn with_files(mut self, files: Vec<FileRef>) -> Self {
        self.files = Some(files);
        self
    }

    pub fn file_count(&self) -> usize {
        self.files.as_ref().map_or(0, Vec::len)
    }
}

/// Entry in an optimized context window.
///
/// Synthetic entries sit in place of the real messages they stand for and
/// carry no timestamp of their own. Serialized with a `kind` tag; input
/// without one is read as a plain chat message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Message {
    Real(ChatMessage),
    CompressionMarker { dropped_count: usize },
    SummaryMarker { original_count: usize, text: String },
}

#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum TaggedMessage {
    Real(ChatMessage),
    CompressionMarker { dropped_count: usize },
    SummaryMarker { original_count: usize, text: String },
}

impl From<TaggedMessage> for Message {
    fn from(tagged: TaggedMessage) -> Self {
        match tagged {
            TaggedMessage::Real(msg) => Message::Real(msg),
            TaggedMessage::CompressionMarker { dropped_count } => {
                Message::CompressionMarker { dropped_count }
            }
            TaggedMessage::SummaryMarker {
                original_count,
                text,
            } => Message::SummaryMarker {
                original_count,
                text,
            },
        }
    }
}

impl<'de> Deserialize<'de> for Message {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        // Unknown fields such as legacy `flags` are ignored on plain messages
        let message = if value.get("kind").is_some() {
            serde_json::from_value::<TaggedMessage>(value).map(Message::from)
        } else {
            serde_json::from_value::<ChatMessage>(value).map(Message::Real)
        };
        message.map_err(serde::de::Error::custom)
    }
}

impl Message {
    pub fn user(text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Message::Real(ChatMessage::new(Role::User, text, timestamp))
    }

    pub fn model(text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Message::Real(ChatMessage::new(Role::Model, text, timestamp))
    }

    pub fn system(text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Message::Real(ChatMessage::new(Role::System, text, timestamp))
    }

    pub fn as_real(&self) -> Option<&ChatMessage> {
        match self {
            Message::Real(msg) => Some(msg),
            _ => None,
        }
    }

    pub fn is_real(&self) -> bool {
        matches!(self, Message::Real(_))
    }

    /// Markers are presented to the model as system notes
    pub fn role(&self) -> Role {
        match self {
            Message::Real(msg) => msg.role,
            _ => Role::System,
        }
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.as_real().map(|msg| msg.timestamp)
    }

    /// Raw text used for scoring and length accounting
    pub fn text(&self) -> &str {
        match self {
            Message::Real(msg) => &msg.text,
            Message::CompressionMarker { .. } => "",
            Message::SummaryMarker { text, .. } => text,
        }
    }

    /// Text a prompt builder should send downstream
    pub fn rendered_text(&self) -> String {
        match self {
            Message::Real(msg) => msg.text.clone(),
            Message::CompressionMarker { dropped_count } => {
                format!("[{} earlier messages omitted]", dropped_count)
            }
            Message::SummaryMarker {
                original_count,
                text,
            } => format!("[Summary of {} earlier messages]\n{}", original_count, text),
        }
    }

    pub fn file_count(&self) -> usize {
        self.as_real().map_or(0, ChatMessage::file_count)
    }
}

impl From<ChatMessage> for Message {
    fn from(msg: ChatMessage) -> Self {
        Message::Real(msg)
    }
}

/// Total characters of raw text across messages
pub fn total_text_length(messages: &[Message]) -> usize {
    messages.iter().map(|m| m.text().chars().count()).sum()
}

/// Auxiliary conversation attached for background knowledge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedContext {
    pub chat_id: String,
    pub subject: String,
    pub messages: Vec<Message>,
}

/// How the query relates to earlier parts of the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Normal,
    SpecificMessages,
    FullConversation,
}

/// Summarization aggressiveness
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    #[default]
    Concise,
    Detailed,
}

impl DetailLevel {
    /// Fraction of the original length the summary should aim for
    pub fn target_reduction(self) -> f64 {
        match self {
            DetailLevel::Concise => 0.55,
            DetailLevel::Detailed => 0.40,
        }
    }
}

/// Result of inspecting a query against the history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    pub strategy: Strategy,
    pub referenced_indices: Vec<usize>,
    pub recommended_window_size: usize,
    pub summary_detail: DetailLevel,
}

impl Default for Analysis {
    fn default() -> Self {
        Self {
            strategy: Strategy::Normal,
            referenced_indices: Vec::new(),
            recommended_window_size: 10,
            summary_detail: DetailLevel::Concise,
        }
    }
}

/// Optimization technique that produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Method {
    None,
    Compression,
    Hybrid,
    SemanticOptimization,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::User.to_string(), "User");
        assert_eq!(Role::Model.to_string(), "Model");
        assert_eq!(Role::System.to_string(), "System");
    }

    #[test]
    fn test_marker_rendering() {
        let marker = Message::CompressionMarker { dropped_count: 7 };
        assert_eq!(marker.rendered_text(), "[7 earlier messages omitted]");
        assert_eq!(marker.text(), "");
        assert_eq!(marker.role(), Role::System);
        assert!(marker.timestamp().is_none());

        let summary = Message::SummaryMarker {
            original_count: 4,
            text: "They discussed lifetimes.".to_string(),
        };
        assert!(summary.rendered_text().starts_with("[Summary of 4 earlier messages]"));
        assert_eq!(summary.text(), "They discussed lifetimes.");
    }

    #[test]
    fn test_message_json_shape() {
        let msg = Message::user("hello", ts(0));
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["kind"], "real");
        assert_eq!(json["role"], "user");
        assert_eq!(json["text"], "hello");
        assert!(json.get("files").is_none());

        let parsed: Message = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, msg);
    }

    #[test]
    fn test_untagged_input_is_real_message() {
        let json = r#"{"role":"model","text":"hello","timestamp":"2024-01-01T00:00:00Z",
            "files":[{"name":"a.txt"}],"flags":{"isCompressed":false,"isSummary":false}}"#;
        let parsed: Message = serde_json::from_str(json).unwrap();

        assert!(parsed.is_real());
        assert_eq!(parsed.role(), Role::Model);
        assert_eq!(parsed.text(), "hello");
        assert_eq!(parsed.file_count(), 1);
    }

    #[test]
    fn test_tagged_marker_round_trip() {
        let marker = Message::SummaryMarker {
            original_count: 6,
            text: "Short recap.".to_string(),
        };
        let json = serde_json::to_value(&marker).unwrap();
        assert_eq!(json["kind"], "summary_marker");
        assert_eq!(serde_json::from_value::<Message>(json).unwrap(), marker);
    }

    #[test]
    fn test_untagged_missing_timestamp_rejected() {
        let json = r#"{"role":"user","text":"hi"}"#;
        assert!(serde_json::from_str::<Message>(json).is_err());
    }

    #[test]
    fn test_missing_timestamp_rejected() {
        let json = r#"{"kind":"real","role":"user","text":"hi"}"#;
        assert!(serde_json::from_str::<Message>(json).is_err());
    }

    #[test]
    fn test_file_count() {
        let msg = ChatMessage::new(Role::User, "see attached", ts(0)).with_files(vec![FileRef {
            name: "notes.pdf".to_string(),
            mime_type: None,
            url: None,
        }]);
        assert_eq!(Message::from(msg).file_count(), 1);
        assert_eq!(Message::model("no files", ts(1)).file_count(), 0);
    }

    #[test]
    fn test_total_text_length_counts_chars() {
        let messages = vec![
            Message::user("héllo", ts(0)),
            Message::CompressionMarker { dropped_count: 3 },
            Message::model("abc", ts(1)),
        ];
        assert_eq!(total_text_length(&messages), 8);
    }

    #[test]
    fn test_method_serializes_kebab_case() {
        let json = serde_json::to_string(&Method::SemanticOptimization).unwrap();
        assert_eq!(json, "\"semantic-optimization\"");
    }
}
