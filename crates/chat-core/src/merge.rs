//! Mapping backend snapshots onto local conversations.

use chrono::{DateTime, Utc};
use chat_types::{
    conversation::Conversation,
    message::{Message, Role, SyncState},
    wire::{parse_timestamp, RemoteConversationSummary, RemoteMessage},
};

/// Prefix of local ids derived from backend message ids. Keeps them
/// disjoint from generator-produced ids.
pub const REMOTE_KEY_PREFIX: &str = "remote";

/// Turn a backend message list into synced local messages, keeping the
/// backend's order.
///
/// A message without an id gets `{conversation_id}-{index}`; missing
/// content becomes empty, an unknown role becomes assistant and a missing
/// or unreadable timestamp becomes `now`.
pub fn map_remote_messages(
    remote: &[RemoteMessage],
    conversation_id: &str,
    now: DateTime<Utc>,
) -> Vec<Message> {
    remote
        .iter()
        .enumerate()
        .map(|(index, msg)| {
            let remote_id = msg
                .id
                .as_ref()
                .map(|id| id.to_string())
                .unwrap_or_else(|| format!("{}-{}", conversation_id, index));
            let role = msg.role.as_deref().map(Role::from_wire).unwrap_or(Role::Assistant);
            let timestamp = msg
                .timestamp
                .as_deref()
                .and_then(parse_timestamp)
                .unwrap_or(now);
            Message::synced(
                format!("{}-{}", REMOTE_KEY_PREFIX, remote_id),
                remote_id,
                msg.content.clone().unwrap_or_default(),
                role,
                timestamp,
            )
        })
        .collect()
}

/// Merge a backend summary into the matching local conversation.
///
/// Last write wins on the title: the backend title is taken only when the
/// backend record is at least as recent as the local one. `updated_at`
/// never moves backwards. Messages are left alone.
pub fn apply_summary(local: &mut Conversation, summary: &RemoteConversationSummary) {
    let remote_updated = summary.updated_at.as_deref().and_then(parse_timestamp);
    let remote_is_newer = remote_updated.map_or(true, |ts| ts >= local.updated_at);

    if remote_is_newer {
        if let Some(title) = summary.title.as_deref().filter(|t| !t.trim().is_empty()) {
            local.title = title.to_string();
        }
    }
    if let Some(created) = summary.created_at.as_deref().and_then(parse_timestamp) {
        local.created_at = created;
    }
    if let Some(updated) = remote_updated {
        local.updated_at = local.updated_at.max(updated);
    }
}

/// A local entry for a backend conversation only known by its summary.
/// Messages are fetched on demand.
pub fn conversation_from_summary(
    id: String,
    summary: &RemoteConversationSummary,
    now: DateTime<Utc>,
) -> Conversation {
    let remote_id = summary.id.to_string();
    let title = summary
        .title
        .clone()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| format!("Conversation {}", remote_id));
    Conversation {
        id,
        title,
        messages: Vec::new(),
        created_at: summary.created_at.as_deref().and_then(parse_timestamp).unwrap_or(now),
        updated_at: summary.updated_at.as_deref().and_then(parse_timestamp).unwrap_or(now),
        remote_id: Some(remote_id),
        sync_state: SyncState::Synced,
    }
}
