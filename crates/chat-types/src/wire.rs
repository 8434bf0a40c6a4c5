//! Backend payloads.
//!
//! Field-level leniency mirrors what the chat backend actually sends:
//! ids arrive as numbers or strings, timestamps may lack a UTC offset and
//! any field may be missing.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Backend identifier: JSON number or string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireId {
    Number(i64),
    Text(String),
}

impl fmt::Display for WireId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireId::Number(n) => write!(f, "{}", n),
            WireId::Text(s) => f.write_str(s),
        }
    }
}

/// Body of the chat endpoint request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub message: String,
    /// Serialized as `null` for a conversation the backend has not seen
    pub conversation_id: Option<String>,
}

/// A message as returned by the backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteMessage {
    #[serde(default)]
    pub id: Option<WireId>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Reply of the chat endpoint.
///
/// `messages` is kept as raw JSON: a reply whose history is not a list of
/// messages is still usable through `answer`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    #[serde(default)]
    pub conversation_id: Option<WireId>,
    #[serde(default)]
    pub messages: Option<Value>,
    #[serde(default)]
    pub answer: Option<String>,
}

impl ChatReply {
    /// The authoritative history, if the reply carries a well-formed one:
    /// a conversation id and an array of message objects.
    pub fn history(&self) -> Option<(String, Vec<RemoteMessage>)> {
        let conversation_id = self.conversation_id.as_ref()?.to_string();
        let raw = self.messages.as_ref()?;
        if !raw.is_array() {
            return None;
        }
        let messages = serde_json::from_value::<Vec<RemoteMessage>>(raw.clone()).ok()?;
        Some((conversation_id, messages))
    }
}

/// Full conversation as returned by the single-conversation endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoteConversation {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub messages: Vec<RemoteMessage>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Conversation entry of the list endpoint (no messages)
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteConversationSummary {
    pub id: WireId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConversationList {
    #[serde(default)]
    pub conversations: Vec<RemoteConversationSummary>,
}

/// Parse a backend timestamp. RFC 3339 first, then naive ISO-8601
/// (read as UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}
