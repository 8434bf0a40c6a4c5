//! Conversation repository: the session's authoritative collection and
//! the sync state machine.
//!
//! Per conversation: Local-Only → Synced → Stale → Synced …, Deleted is
//! terminal. Every operation is synchronous and atomic with respect to the
//! collection; the async loads await the gateway without holding the
//! collection borrow and re-check ids before mutating. Operations on an id
//! that no longer exists are no-ops.
//!
//! The list is kept most-recently-updated first and persisted after every
//! mutation.

use std::cell::RefCell;
use std::rc::Rc;

use chat_types::{
    conversation::{derive_title, Conversation},
    event::ConversationEvent,
    message::{Message, Role, SyncState},
    wire::{parse_timestamp, RemoteConversation, RemoteConversationSummary, RemoteMessage},
};

use crate::event_bus::EventBus;
use crate::ids::IdGenerator;
use crate::merge::{apply_summary, conversation_from_summary, map_remote_messages};
use crate::ports::{ClockPort, GatewayPort};
use crate::store::ConversationStore;

/// Title of a backend conversation fetched without one
pub const RECOVERED_TITLE: &str = "Recovered conversation";

#[derive(Default)]
struct Collection {
    conversations: Vec<Conversation>,
    current: Option<String>,
    loading: u32,
}

impl Collection {
    fn position(&self, id: &str) -> Option<usize> {
        self.conversations.iter().position(|c| c.id == id)
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut Conversation> {
        self.conversations.iter_mut().find(|c| c.id == id)
    }

    fn find_by_remote(&self, remote_id: &str) -> Option<String> {
        self.conversations
            .iter()
            .find(|c| c.remote_id.as_deref() == Some(remote_id))
            .map(|c| c.id.clone())
    }

    /// Remove entries other than `keep` that mirror `remote_id` without any
    /// pending local message, i.e. summary-only copies inserted by a list
    /// load that raced the first round-trip of `keep`. Returns true when the
    /// current pointer moved to `keep`.
    fn drop_placeholders(&mut self, keep: &str, remote_id: &str) -> bool {
        let duplicates: Vec<String> = self
            .conversations
            .iter()
            .filter(|c| {
                c.id != keep
                    && c.remote_id.as_deref() == Some(remote_id)
                    && c.messages.iter().all(|m| m.is_synced())
            })
            .map(|c| c.id.clone())
            .collect();
        if duplicates.is_empty() {
            return false;
        }
        log::debug!("Dropping {} duplicate mirror(s) of {}", duplicates.len(), remote_id);
        self.conversations.retain(|c| !duplicates.contains(&c.id));

        let current_dropped = self
            .current
            .as_ref()
            .is_some_and(|current| duplicates.contains(current));
        if current_dropped {
            self.current = Some(keep.to_string());
        }
        current_dropped
    }

    /// Stable: equal timestamps keep their relative order.
    fn sort(&mut self) {
        self.conversations
            .sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    }
}

/// Shared handle: clone-cheap via Rc. All clones see the same collection.
#[derive(Clone)]
pub struct ConversationRepository {
    collection: Rc<RefCell<Collection>>,
    store: Rc<ConversationStore>,
    ids: Rc<IdGenerator>,
    clock: Rc<dyn ClockPort>,
    events: EventBus,
}

impl ConversationRepository {
    /// Load the persisted collection and select its most recently updated
    /// conversation.
    pub fn open(
        store: Rc<ConversationStore>,
        ids: Rc<IdGenerator>,
        clock: Rc<dyn ClockPort>,
        events: EventBus,
    ) -> Self {
        let mut collection = Collection {
            conversations: store.load(),
            ..Default::default()
        };
        collection.sort();
        collection.current = collection.conversations.first().map(|c| c.id.clone());

        if !collection.conversations.is_empty() {
            events.emit(ConversationEvent::CollectionChanged);
            events.emit(ConversationEvent::CurrentChanged {
                id: collection.current.clone(),
            });
        }

        Self {
            collection: Rc::new(RefCell::new(collection)),
            store,
            ids,
            clock,
            events,
        }
    }

    // ─── Reads ───────────────────────────────────────────────

    /// Snapshot of the collection, most recently updated first.
    pub fn conversations(&self) -> Vec<Conversation> {
        self.collection.borrow().conversations.clone()
    }

    pub fn get(&self, id: &str) -> Option<Conversation> {
        let c = self.collection.borrow();
        c.conversations.iter().find(|conv| conv.id == id).cloned()
    }

    pub fn current(&self) -> Option<Conversation> {
        let id = self.current_id()?;
        self.get(&id)
    }

    pub fn current_id(&self) -> Option<String> {
        self.collection.borrow().current.clone()
    }

    /// Backend id of the current conversation, if it has one yet.
    pub fn current_remote_id(&self) -> Option<String> {
        self.current().and_then(|c| c.remote_id)
    }

    pub fn len(&self) -> usize {
        self.collection.borrow().conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True while a `load_one`/`load_all` is awaiting the backend.
    pub fn is_loading(&self) -> bool {
        self.collection.borrow().loading > 0
    }

    /// Case-insensitive substring match on title or any message body.
    /// A blank query returns the whole collection in order; any other query
    /// is matched as typed, surrounding spaces included.
    pub fn search(&self, query: &str) -> Vec<Conversation> {
        let c = self.collection.borrow();
        if query.trim().is_empty() {
            return c.conversations.clone();
        }
        let needle = query.to_lowercase();
        c.conversations
            .iter()
            .filter(|conv| conv.matches(&needle))
            .cloned()
            .collect()
    }

    // ─── Local mutations ─────────────────────────────────────

    /// New local-only conversation, made current.
    pub fn create(&self) -> Conversation {
        let conversation = Conversation::new(self.ids.new_id(None), self.clock.now());
        {
            let mut c = self.collection.borrow_mut();
            c.conversations.insert(0, conversation.clone());
            c.current = Some(conversation.id.clone());
            self.commit(&mut c);
        }
        self.events.emit(ConversationEvent::CurrentChanged {
            id: Some(conversation.id.clone()),
        });
        conversation
    }

    pub fn select(&self, id: &str) {
        {
            let mut c = self.collection.borrow_mut();
            if c.position(id).is_none() || c.current.as_deref() == Some(id) {
                return;
            }
            c.current = Some(id.to_string());
        }
        self.events.emit(ConversationEvent::CurrentChanged {
            id: Some(id.to_string()),
        });
    }

    /// Remove a conversation. Deleting the current one selects the most
    /// recently updated survivor, or nothing.
    pub fn delete(&self, id: &str) {
        let reselected = {
            let mut c = self.collection.borrow_mut();
            let Some(pos) = c.position(id) else {
                return;
            };
            c.conversations.remove(pos);
            let was_current = c.current.as_deref() == Some(id);
            if was_current {
                c.current = c.conversations.first().map(|conv| conv.id.clone());
            }
            self.commit(&mut c);
            was_current.then(|| c.current.clone())
        };
        if let Some(id) = reselected {
            self.events.emit(ConversationEvent::CurrentChanged { id });
        }
    }

    /// Returns false for an unknown id or a blank title.
    pub fn rename(&self, id: &str, new_title: &str) -> bool {
        let title = new_title.trim();
        if title.is_empty() {
            return false;
        }
        let now = self.clock.now();
        let mut c = self.collection.borrow_mut();
        let Some(conv) = c.find_mut(id) else {
            return false;
        };
        conv.title = title.to_string();
        conv.updated_at = now;
        self.commit(&mut c);
        true
    }

    /// Append a pending message to the current conversation.
    /// `None` when nothing is selected.
    pub fn append_message(&self, content: &str, role: Role) -> Option<Message> {
        let id = self.current_id()?;
        self.append_message_to(&id, content, role)
    }

    /// Append a pending message to a specific conversation.
    /// `None` when the conversation no longer exists.
    pub fn append_message_to(&self, id: &str, content: &str, role: Role) -> Option<Message> {
        let now = self.clock.now();
        let mut c = self.collection.borrow_mut();
        let conv = c.find_mut(id)?;

        let message = Message::pending(self.ids.new_id(None), content, role, now);
        if role == Role::User && conv.awaits_title() {
            conv.title = derive_title(content);
        }
        conv.messages.push(message.clone());
        conv.sync_state = SyncState::Pending;
        conv.updated_at = now;

        self.commit(&mut c);
        Some(message)
    }

    // ─── Sync ────────────────────────────────────────────────

    /// Replace the current conversation's history with a backend snapshot.
    pub fn sync_from_backend(&self, remote_messages: &[RemoteMessage], remote_conv_id: &str) -> bool {
        match self.current_id() {
            Some(id) => self.sync_conversation(&id, remote_messages, remote_conv_id),
            None => false,
        }
    }

    /// Replace a conversation's history with a backend snapshot.
    ///
    /// Full replacement in the backend's order: pending local messages the
    /// backend did not echo are dropped. Other entries mirroring the same
    /// backend conversation with nothing pending are removed, and the
    /// current pointer follows. Returns false when the conversation no
    /// longer exists.
    pub fn sync_conversation(
        &self,
        id: &str,
        remote_messages: &[RemoteMessage],
        remote_conv_id: &str,
    ) -> bool {
        let now = self.clock.now();
        let messages = map_remote_messages(remote_messages, remote_conv_id, now);

        let reselected = {
            let mut c = self.collection.borrow_mut();
            let Some(conv) = c.find_mut(id) else {
                return false;
            };
            conv.messages = messages;
            conv.remote_id = Some(remote_conv_id.to_string());
            conv.sync_state = SyncState::Synced;
            conv.updated_at = now;

            let reselected = c.drop_placeholders(id, remote_conv_id);
            self.commit(&mut c);
            reselected
        };
        if reselected {
            self.events.emit(ConversationEvent::CurrentChanged {
                id: Some(id.to_string()),
            });
        }
        true
    }

    /// Fetch one backend conversation and make it current, updating the
    /// local copy if one already mirrors it. Returns false when it could
    /// not be loaded; local state is then untouched.
    pub async fn load_one(&self, gateway: &dyn GatewayPort, remote_id: &str) -> bool {
        self.begin_loading();
        let result = gateway.fetch_conversation(remote_id).await;
        self.end_loading();

        match result {
            Ok(remote) => {
                let id = self.apply_loaded(remote_id, remote);
                self.select(&id);
                true
            }
            Err(e) => {
                log::error!("Could not load conversation {}: {}", remote_id, e);
                false
            }
        }
    }

    /// Fetch backend summaries and merge them by remote id. Local-only
    /// conversations are never dropped. Returns false on failure; the
    /// collection is then untouched.
    pub async fn load_all(&self, gateway: &dyn GatewayPort) -> bool {
        self.begin_loading();
        let result = gateway.fetch_conversations().await;
        self.end_loading();

        match result {
            Ok(summaries) => {
                log::debug!("Merging {} backend conversations", summaries.len());
                self.merge_summaries(&summaries);
                true
            }
            Err(e) => {
                log::error!("Could not load conversations: {}", e);
                false
            }
        }
    }

    fn apply_loaded(&self, remote_id: &str, remote: RemoteConversation) -> String {
        let existing = self.collection.borrow().find_by_remote(remote_id);
        if let Some(id) = existing {
            self.sync_conversation(&id, &remote.messages, remote_id);
            return id;
        }

        let now = self.clock.now();
        let conversation = Conversation {
            id: self.ids.new_id(None),
            title: remote
                .title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| RECOVERED_TITLE.to_string()),
            messages: map_remote_messages(&remote.messages, remote_id, now),
            created_at: remote.created_at.as_deref().and_then(parse_timestamp).unwrap_or(now),
            updated_at: remote.updated_at.as_deref().and_then(parse_timestamp).unwrap_or(now),
            remote_id: Some(remote_id.to_string()),
            sync_state: SyncState::Synced,
        };
        let id = conversation.id.clone();

        let mut c = self.collection.borrow_mut();
        c.conversations.insert(0, conversation);
        self.commit(&mut c);
        id
    }

    fn merge_summaries(&self, summaries: &[RemoteConversationSummary]) {
        let now = self.clock.now();
        let mut c = self.collection.borrow_mut();
        for summary in summaries {
            let remote_id = summary.id.to_string();
            let existing = c
                .conversations
                .iter()
                .position(|conv| conv.remote_id.as_deref() == Some(remote_id.as_str()));
            match existing {
                Some(pos) => apply_summary(&mut c.conversations[pos], summary),
                None => {
                    let local = conversation_from_summary(self.ids.new_id(None), summary, now);
                    c.conversations.push(local);
                }
            }
        }
        self.commit(&mut c);
    }

    // ─── Internals ───────────────────────────────────────────

    /// Re-sort, persist and notify. Called with the collection borrowed.
    fn commit(&self, c: &mut Collection) {
        c.sort();
        self.store.save(&c.conversations);
        self.events.emit(ConversationEvent::CollectionChanged);
    }

    fn begin_loading(&self) {
        let mut c = self.collection.borrow_mut();
        c.loading += 1;
        if c.loading == 1 {
            self.events.emit(ConversationEvent::LoadingStarted);
        }
    }

    fn end_loading(&self) {
        let mut c = self.collection.borrow_mut();
        c.loading = c.loading.saturating_sub(1);
        if c.loading == 0 {
            self.events.emit(ConversationEvent::LoadingFinished);
        }
    }
}
