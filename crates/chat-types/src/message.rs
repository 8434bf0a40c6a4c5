use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Backend roles other than `"user"` are rendered as assistant replies.
    pub fn from_wire(role: &str) -> Self {
        if role == "user" {
            Role::User
        } else {
            Role::Assistant
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Whether local state has been confirmed by a backend snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    #[default]
    Pending,
    Synced,
}

/// A single chat message.
///
/// `role` and `sync_state` are fixed at construction; a synced message
/// only ever comes from a backend snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Stable render key, unique within the session
    pub local_id: String,
    pub content: String,
    role: Role,
    pub timestamp: DateTime<Utc>,
    /// Backend identifier, once known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<String>,
    #[serde(default)]
    sync_state: SyncState,
}

impl Message {
    /// A message created locally and not yet echoed by the backend.
    pub fn pending(
        local_id: impl Into<String>,
        content: impl Into<String>,
        role: Role,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            local_id: local_id.into(),
            content: content.into(),
            role,
            timestamp,
            remote_id: None,
            sync_state: SyncState::Pending,
        }
    }

    /// A message taken from an authoritative backend snapshot.
    pub fn synced(
        local_id: impl Into<String>,
        remote_id: impl Into<String>,
        content: impl Into<String>,
        role: Role,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            local_id: local_id.into(),
            content: content.into(),
            role,
            timestamp,
            remote_id: Some(remote_id.into()),
            sync_state: SyncState::Synced,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn sync_state(&self) -> SyncState {
        self.sync_state
    }

    pub fn is_synced(&self) -> bool {
        self.sync_state == SyncState::Synced
    }
}
