use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::message::{Message, Role, SyncState};

pub const DEFAULT_TITLE: &str = "New Conversation";

/// Title length taken from the first user message.
pub const TITLE_MAX_CHARS: usize = 50;

/// A titled, ordered sequence of messages, optionally mirrored to a
/// backend record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<String>,
    #[serde(default)]
    pub sync_state: SyncState,
}

/// Where a conversation sits in the sync state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Never confirmed by the backend
    LocalOnly,
    /// Messages mirror the backend
    Synced,
    /// Known to the backend, with local changes not yet confirmed
    Stale,
}

impl Conversation {
    pub fn new(id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            title: DEFAULT_TITLE.to_string(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
            remote_id: None,
            sync_state: SyncState::Pending,
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        match (&self.remote_id, self.sync_state) {
            (None, _) => Lifecycle::LocalOnly,
            (Some(_), SyncState::Synced) => Lifecycle::Synced,
            (Some(_), SyncState::Pending) => Lifecycle::Stale,
        }
    }

    /// True while the title is still the default and no user message has
    /// been appended, i.e. the next user message names the conversation.
    pub fn awaits_title(&self) -> bool {
        self.title == DEFAULT_TITLE && !self.messages.iter().any(|m| m.role() == Role::User)
    }

    /// Case-insensitive match on title or any message body.
    /// `needle` must already be lowercase.
    pub fn matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self
                .messages
                .iter()
                .any(|m| m.content.to_lowercase().contains(needle))
    }
}

/// Title derived from the first user message: the first
/// [`TITLE_MAX_CHARS`] characters, with `...` appended when cut.
pub fn derive_title(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(TITLE_MAX_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}
