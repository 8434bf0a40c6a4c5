use serde::{Deserialize, Serialize};

/// Events emitted by the conversation layer.
/// UI subscribes to these for reactive updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ConversationEvent {
    /// Conversations were added, removed, reordered or edited
    CollectionChanged,
    /// The current conversation pointer moved
    CurrentChanged { id: Option<String> },
    /// A backend load started
    LoadingStarted,
    /// A backend load finished, successfully or not
    LoadingFinished,
    /// A submit round-trip failed in transport; the message is the
    /// user-facing text also appended to the conversation. Failed loads
    /// are only logged.
    SyncFailed { message: String },
}
