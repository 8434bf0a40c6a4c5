//! Port traits: the hexagonal architecture boundary.
//!
//! These traits are defined here in `chat-core` (pure Rust).
//! Implementations live in `chat-platform` (browser adapters).
//! The core never imports platform code; it only depends on these traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chat_types::{
    Result,
    wire::{ChatReply, RemoteConversation, RemoteConversationSummary},
};

// ─── Gateway Port ────────────────────────────────────────────

/// Network access to the backend conversation API.
#[async_trait(?Send)]
pub trait GatewayPort {
    /// Fetch one conversation with its messages.
    /// Fails with `NotFound` for an unknown id.
    async fn fetch_conversation(&self, remote_id: &str) -> Result<RemoteConversation>;

    /// Fetch summaries (no messages) of every backend conversation.
    async fn fetch_conversations(&self) -> Result<Vec<RemoteConversationSummary>>;

    /// Send a user message. `conversation_id` is `None` until the backend
    /// has assigned one.
    async fn send_message(&self, content: &str, conversation_id: Option<&str>)
        -> Result<ChatReply>;
}

// ─── Storage Port ────────────────────────────────────────────

/// Durable string key-value slot (`localStorage` semantics: synchronous).
pub trait StoragePort {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;

    /// Name of this backend (for logging/debug)
    fn backend_name(&self) -> &str;
}

// ─── Clock Port ──────────────────────────────────────────────

pub trait ClockPort {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock. `chrono`'s `wasmbind` feature routes this to `Date.now()`.
pub struct SystemClock;

impl ClockPort for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
