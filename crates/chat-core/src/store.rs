//! Persistent store adapter: the conversation list in one durable slot.
//!
//! Persistence is best-effort: a corrupt slot is discarded whole on load,
//! and a failed write only costs durability, never the in-memory session.

use std::rc::Rc;

use chat_types::conversation::Conversation;

use crate::ports::StoragePort;

pub struct ConversationStore {
    storage: Rc<dyn StoragePort>,
    key: String,
}

impl ConversationStore {
    pub fn new(storage: Rc<dyn StoragePort>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn backend_name(&self) -> &str {
        self.storage.backend_name()
    }

    /// Read the slot. Missing, unreadable or corrupt data yields an empty
    /// list; corrupt data is also cleared so it is not read again.
    pub fn load(&self) -> Vec<Conversation> {
        let raw = match self.storage.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                log::warn!("Could not read '{}' from {}: {}", self.key, self.backend_name(), e);
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<Conversation>>(&raw) {
            Ok(conversations) => {
                log::info!(
                    "Loaded {} conversations from {}",
                    conversations.len(),
                    self.backend_name()
                );
                conversations
            }
            Err(e) => {
                log::warn!("Discarding corrupt conversation slot '{}': {}", self.key, e);
                if let Err(e) = self.storage.remove(&self.key) {
                    log::warn!("Could not clear '{}': {}", self.key, e);
                }
                Vec::new()
            }
        }
    }

    pub fn save(&self, conversations: &[Conversation]) {
        let json = match serde_json::to_string(conversations) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("Could not serialize conversations: {}", e);
                return;
            }
        };
        if let Err(e) = self.storage.set(&self.key, &json) {
            log::warn!("Could not save conversations to {}: {}", self.backend_name(), e);
        }
    }
}
