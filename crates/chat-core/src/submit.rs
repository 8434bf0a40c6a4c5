//! Chat submission orchestrator: one user-message round-trip.
//!
//! 1. Ensure a current conversation (created synchronously).
//! 2. Append the user message optimistically.
//! 3. Send it with the conversation's backend id, if any.
//! 4. Well-formed reply → replace the history with the backend's.
//! 5. Reply without a usable history → append its answer (or a
//!    placeholder) as an assistant message.
//! 6. Transport failure → append the error as an assistant message; the
//!    user's message stays pending.
//!
//! Nothing is retried. The round-trip is pinned to the conversation that
//! was current when it started, so switching conversations mid-flight
//! cannot misroute the reply, and a conversation deleted mid-flight is
//! simply not touched.

use std::cell::{Cell, RefCell};

use chat_types::{event::ConversationEvent, message::Role};
use serde::Serialize;

use crate::event_bus::EventBus;
use crate::ports::GatewayPort;
use crate::repository::ConversationRepository;

pub const NO_ANSWER_PLACEHOLDER: &str = "Error: no response received";

/// Result of one submission, for the host's housekeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SubmitOutcome {
    /// Blank input, nothing sent
    Ignored,
    /// A submission is already in flight
    Busy,
    /// History replaced by the backend's
    Synced { conversation_id: String },
    /// Reply had no usable history; a single assistant message was added
    Degraded { conversation_id: String },
    /// Transport failure, shown inline in the transcript
    Failed { conversation_id: String, error: String },
    /// The conversation was deleted before the reply arrived
    Abandoned { conversation_id: String },
}

impl SubmitOutcome {
    /// Whether the request reached the backend and came back usable.
    pub fn is_success(&self) -> bool {
        matches!(self, SubmitOutcome::Synced { .. } | SubmitOutcome::Degraded { .. })
    }
}

pub struct ChatSubmitter {
    repository: ConversationRepository,
    events: EventBus,
    in_flight: Cell<bool>,
    last_error: RefCell<Option<String>>,
}

impl ChatSubmitter {
    pub fn new(repository: ConversationRepository, events: EventBus) -> Self {
        Self {
            repository,
            events,
            in_flight: Cell::new(false),
            last_error: RefCell::new(None),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.get()
    }

    /// Text of the most recent failure, cleared when a new submit starts.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.borrow().clone()
    }

    pub async fn submit(&self, input: &str, gateway: &dyn GatewayPort) -> SubmitOutcome {
        let text = input.trim();
        if text.is_empty() {
            return SubmitOutcome::Ignored;
        }
        if self.in_flight.replace(true) {
            return SubmitOutcome::Busy;
        }
        *self.last_error.borrow_mut() = None;

        let outcome = self.round_trip(text, gateway).await;

        self.in_flight.set(false);
        outcome
    }

    async fn round_trip(&self, text: &str, gateway: &dyn GatewayPort) -> SubmitOutcome {
        let conversation_id = match self.repository.current_id() {
            Some(id) => id,
            None => self.repository.create().id,
        };
        let remote_id = self
            .repository
            .get(&conversation_id)
            .and_then(|c| c.remote_id);

        self.repository
            .append_message_to(&conversation_id, text, Role::User);
        log::debug!(
            "Sending message for {} (backend id {:?})",
            conversation_id,
            remote_id
        );

        let reply = match gateway.send_message(text, remote_id.as_deref()).await {
            Ok(reply) => reply,
            Err(e) if e.is_transport() => {
                log::error!("Message send failed: {}", e);
                let message = format!("Connection error: {}", e);
                return self.fail(conversation_id, message);
            }
            Err(e) => {
                log::warn!("Unreadable chat reply: {}", e);
                *self.last_error.borrow_mut() = Some(e.to_string());
                return self.degrade(conversation_id, None);
            }
        };

        match reply.history() {
            Some((remote_conv_id, messages)) => {
                if self
                    .repository
                    .sync_conversation(&conversation_id, &messages, &remote_conv_id)
                {
                    log::debug!("Synced {} messages into {}", messages.len(), conversation_id);
                    SubmitOutcome::Synced { conversation_id }
                } else {
                    log::warn!("Conversation {} deleted before reply arrived", conversation_id);
                    SubmitOutcome::Abandoned { conversation_id }
                }
            }
            None => {
                log::warn!("Chat reply carried no history, appending answer only");
                self.degrade(conversation_id, reply.answer)
            }
        }
    }

    fn degrade(&self, conversation_id: String, answer: Option<String>) -> SubmitOutcome {
        let answer = answer
            .filter(|a| !a.trim().is_empty())
            .unwrap_or_else(|| NO_ANSWER_PLACEHOLDER.to_string());
        match self
            .repository
            .append_message_to(&conversation_id, &answer, Role::Assistant)
        {
            Some(_) => SubmitOutcome::Degraded { conversation_id },
            None => SubmitOutcome::Abandoned { conversation_id },
        }
    }

    fn fail(&self, conversation_id: String, error: String) -> SubmitOutcome {
        *self.last_error.borrow_mut() = Some(error.clone());
        match self
            .repository
            .append_message_to(&conversation_id, &error, Role::Assistant)
        {
            Some(_) => {
                self.events.emit(ConversationEvent::SyncFailed {
                    message: error.clone(),
                });
                SubmitOutcome::Failed { conversation_id, error }
            }
            None => SubmitOutcome::Abandoned { conversation_id },
        }
    }
}
