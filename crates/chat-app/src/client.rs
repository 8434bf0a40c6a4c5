//! `ChatClient`: the class a JavaScript host drives.
//!
//! Every mutating call flushes the event bus to subscribers before it
//! returns. Async calls return promises that always resolve; failures are
//! reported in the resolved value and through `SyncFailed` events.

use std::cell::RefCell;
use std::rc::Rc;

use gloo_utils::format::JsValueSerdeExt;
use js_sys::{Function, Promise};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

use chat_core::event_bus::EventBus;
use chat_core::ids::IdGenerator;
use chat_core::ports::{ClockPort, GatewayPort, SystemClock};
use chat_core::repository::ConversationRepository;
use chat_core::store::ConversationStore;
use chat_core::submit::ChatSubmitter;
use chat_platform::storage::auto_detect_storage;
use chat_platform::{HttpGateway, RefreshTask};
use chat_types::{config::ClientConfig, ChatError, Result};

use crate::notify::{FlushingGateway, Notifier};

/// Parse the host's configuration. Absent or blank input means defaults;
/// missing fields take their defaults too.
pub(crate) fn parse_config(json: Option<&str>) -> Result<ClientConfig> {
    match json.map(str::trim).filter(|j| !j.is_empty()) {
        Some(json) => serde_json::from_str(json).map_err(|e| ChatError::Config(e.to_string())),
        None => Ok(ClientConfig::default()),
    }
}

/// A value that could not be handed across to JavaScript.
pub(crate) fn interop_error(e: impl std::fmt::Display) -> ChatError {
    ChatError::JsInterop(e.to_string())
}

fn to_js<T: Serialize>(value: &T) -> std::result::Result<JsValue, JsValue> {
    JsValue::from_serde(value).map_err(|e| JsValue::from_str(&interop_error(e).to_string()))
}

/// State shared between the class and the futures it spawns.
struct Session {
    config: ClientConfig,
    repository: ConversationRepository,
    submitter: ChatSubmitter,
    gateway: Rc<dyn GatewayPort>,
    notifier: Rc<Notifier>,
}

#[wasm_bindgen]
pub struct ChatClient {
    session: Rc<Session>,
    refresh: RefCell<Option<RefreshTask>>,
}

#[wasm_bindgen]
impl ChatClient {
    /// `config_json` is an optional, possibly partial, `ClientConfig`.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> std::result::Result<ChatClient, JsValue> {
        let config = parse_config(config_json.as_deref())
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        let events = EventBus::new();
        let storage = auto_detect_storage(&config.storage.backend);
        let store = Rc::new(ConversationStore::new(storage, config.storage.key.clone()));
        let clock: Rc<dyn ClockPort> = Rc::new(SystemClock);
        let repository =
            ConversationRepository::open(store, Rc::new(IdGenerator::new()), clock, events.clone());
        // Startup state is read directly by the host
        let _ = events.drain();

        let notifier = Rc::new(Notifier::new(events.clone()));
        let http: Rc<dyn GatewayPort> = Rc::new(HttpGateway::new(config.api.clone()));
        let gateway: Rc<dyn GatewayPort> = Rc::new(FlushingGateway::new(http, notifier.clone()));
        let submitter = ChatSubmitter::new(repository.clone(), events);

        log::info!(
            "Chat client ready: {} conversations, backend {}",
            repository.len(),
            config.api.base_url
        );

        Ok(ChatClient {
            session: Rc::new(Session {
                config,
                repository,
                submitter,
                gateway,
                notifier,
            }),
            refresh: RefCell::new(None),
        })
    }

    // ─── Reads ───────────────────────────────────────────────

    pub fn conversations(&self) -> std::result::Result<JsValue, JsValue> {
        to_js(&self.session.repository.conversations())
    }

    /// The current conversation, or `null`.
    pub fn current(&self) -> std::result::Result<JsValue, JsValue> {
        to_js(&self.session.repository.current())
    }

    #[wasm_bindgen(js_name = currentRemoteId)]
    pub fn current_remote_id(&self) -> Option<String> {
        self.session.repository.current_remote_id()
    }

    pub fn search(&self, query: &str) -> std::result::Result<JsValue, JsValue> {
        to_js(&self.session.repository.search(query))
    }

    #[wasm_bindgen(js_name = isLoading)]
    pub fn is_loading(&self) -> bool {
        self.session.repository.is_loading()
    }

    #[wasm_bindgen(js_name = isBusy)]
    pub fn is_busy(&self) -> bool {
        self.session.submitter.is_busy()
    }

    #[wasm_bindgen(js_name = lastError)]
    pub fn last_error(&self) -> Option<String> {
        self.session.submitter.last_error()
    }

    // ─── Mutations ───────────────────────────────────────────

    pub fn create(&self) -> std::result::Result<JsValue, JsValue> {
        let conversation = self.session.repository.create();
        self.session.notifier.flush();
        to_js(&conversation)
    }

    pub fn select(&self, id: &str) {
        self.session.repository.select(id);
        self.session.notifier.flush();
    }

    pub fn delete(&self, id: &str) {
        self.session.repository.delete(id);
        self.session.notifier.flush();
    }

    pub fn rename(&self, id: &str, title: &str) -> bool {
        let renamed = self.session.repository.rename(id, title);
        self.session.notifier.flush();
        renamed
    }

    /// Resolves with the `SubmitOutcome` once the round-trip settles.
    pub fn submit(&self, text: String) -> Promise {
        let session = self.session.clone();
        future_to_promise(async move {
            let outcome = session.submitter.submit(&text, session.gateway.as_ref()).await;
            session.notifier.flush();
            to_js(&outcome)
        })
    }

    /// Resolves with `true` when the conversation was loaded and selected.
    #[wasm_bindgen(js_name = loadOne)]
    pub fn load_one(&self, remote_id: String) -> Promise {
        let session = self.session.clone();
        future_to_promise(async move {
            let ok = session
                .repository
                .load_one(session.gateway.as_ref(), &remote_id)
                .await;
            session.notifier.flush();
            Ok(JsValue::from_bool(ok))
        })
    }

    #[wasm_bindgen(js_name = loadAll)]
    pub fn load_all(&self) -> Promise {
        let session = self.session.clone();
        future_to_promise(async move {
            let ok = session.repository.load_all(session.gateway.as_ref()).await;
            session.notifier.flush();
            Ok(JsValue::from_bool(ok))
        })
    }

    // ─── Subscriptions ───────────────────────────────────────

    /// `callback` receives each event as `{ type, ... }`.
    pub fn subscribe(&self, callback: Function) {
        self.session.notifier.subscribe(callback);
    }

    pub fn unsubscribe(&self, callback: &Function) -> bool {
        self.session.notifier.unsubscribe(callback)
    }

    // ─── Background refresh ──────────────────────────────────

    #[wasm_bindgen(js_name = startAutoRefresh)]
    pub fn start_auto_refresh(&self) {
        let mut refresh = self.refresh.borrow_mut();
        if refresh.as_ref().is_some_and(RefreshTask::is_running) {
            return;
        }
        let notifier = self.session.notifier.clone();
        let on_done: Rc<dyn Fn(bool)> = Rc::new(move |ok| {
            if !ok {
                log::debug!("Background refresh failed, keeping local conversations");
            }
            notifier.flush();
        });
        *refresh = Some(RefreshTask::start(
            self.session.repository.clone(),
            self.session.gateway.clone(),
            self.session.config.refresh_interval_secs,
            on_done,
        ));
    }

    #[wasm_bindgen(js_name = stopAutoRefresh)]
    pub fn stop_auto_refresh(&self) {
        if let Some(mut task) = self.refresh.borrow_mut().take() {
            task.cancel();
        }
    }
}
