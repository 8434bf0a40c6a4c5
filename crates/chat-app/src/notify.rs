//! Delivery of conversation events to JavaScript subscribers.

use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use gloo_utils::format::JsValueSerdeExt;
use js_sys::Function;
use wasm_bindgen::JsValue;

use chat_core::event_bus::EventBus;
use chat_core::ports::GatewayPort;
use chat_types::{
    Result,
    wire::{ChatReply, RemoteConversation, RemoteConversationSummary},
};

use crate::client::interop_error;

/// Drains the event bus into the registered callbacks.
pub struct Notifier {
    events: EventBus,
    callbacks: RefCell<Vec<Function>>,
}

impl Notifier {
    pub fn new(events: EventBus) -> Self {
        Self {
            events,
            callbacks: RefCell::new(Vec::new()),
        }
    }

    pub fn subscribe(&self, callback: Function) {
        self.callbacks.borrow_mut().push(callback);
    }

    pub fn unsubscribe(&self, callback: &Function) -> bool {
        let target: &JsValue = callback.as_ref();
        let mut callbacks = self.callbacks.borrow_mut();
        let before = callbacks.len();
        callbacks.retain(|c| {
            let current: &JsValue = c.as_ref();
            current != target
        });
        callbacks.len() != before
    }

    /// Deliver every pending event, in order, to every subscriber.
    pub fn flush(&self) {
        let events = self.events.drain();
        if events.is_empty() {
            return;
        }
        // Callbacks may subscribe or call back into the client
        let callbacks = self.callbacks.borrow().clone();
        for event in events {
            let value = match JsValue::from_serde(&event) {
                Ok(value) => value,
                Err(e) => {
                    log::warn!("Dropping event {:?}: {}", event, interop_error(e));
                    continue;
                }
            };
            for callback in &callbacks {
                if let Err(e) = callback.call1(&JsValue::NULL, &value) {
                    log::warn!("Event subscriber threw: {:?}", e);
                }
            }
        }
    }
}

/// Gateway decorator that flushes pending events before each request, so
/// subscribers see optimistic updates while the request is on the wire.
pub struct FlushingGateway {
    inner: Rc<dyn GatewayPort>,
    notifier: Rc<Notifier>,
}

impl FlushingGateway {
    pub fn new(inner: Rc<dyn GatewayPort>, notifier: Rc<Notifier>) -> Self {
        Self { inner, notifier }
    }
}

#[async_trait(?Send)]
impl GatewayPort for FlushingGateway {
    async fn fetch_conversation(&self, remote_id: &str) -> Result<RemoteConversation> {
        self.notifier.flush();
        self.inner.fetch_conversation(remote_id).await
    }

    async fn fetch_conversations(&self) -> Result<Vec<RemoteConversationSummary>> {
        self.notifier.flush();
        self.inner.fetch_conversations().await
    }

    async fn send_message(
        &self,
        content: &str,
        conversation_id: Option<&str>,
    ) -> Result<ChatReply> {
        self.notifier.flush();
        self.inner.send_message(content, conversation_id).await
    }
}
