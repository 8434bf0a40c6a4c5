//! WASM-target tests for chat-platform (Node.js runtime).
//!
//! Tests MemoryStorage, backend selection, ConversationStore over the
//! platform backends, HTTP status mapping and RefreshTask under
//! wasm32-unknown-unknown via `wasm-pack test --node`.
//!
//! There is no `window` under Node, so `auto_detect_storage` always falls
//! back to memory here.

use wasm_bindgen_test::*;

use chat_core::event_bus::EventBus;
use chat_core::ids::IdGenerator;
use chat_core::ports::{ClockPort, GatewayPort, StoragePort, SystemClock};
use chat_core::repository::ConversationRepository;
use chat_core::store::ConversationStore;
use chat_platform::gateway::{check_status, parse_body};
use chat_platform::refresh::{period_millis, MAX_PERIOD_MILLIS};
use chat_platform::storage::{auto_detect_storage, LocalStorage, MemoryStorage};
use chat_platform::{HttpGateway, RefreshTask};
use chat_types::config::{ApiConfig, StorageBackendType};
use chat_types::conversation::Conversation;
use chat_types::wire::{ChatReply, ConversationList, RemoteConversation, RemoteConversationSummary};
use chat_types::{ChatError, Result};
use chrono::Utc;

use std::cell::Cell;
use std::rc::Rc;

use async_trait::async_trait;
use gloo_timers::future::TimeoutFuture;

// ─── MemoryStorage Tests ─────────────────────────────────

#[wasm_bindgen_test]
fn memory_storage_backend_name() {
    let storage = MemoryStorage::new();
    assert_eq!(storage.backend_name(), "memory");
}

#[wasm_bindgen_test]
fn memory_storage_get_missing() {
    let storage = MemoryStorage::new();
    assert!(storage.get("nonexistent").unwrap().is_none());
}

#[wasm_bindgen_test]
fn memory_storage_set_and_get() {
    let storage = MemoryStorage::new();
    storage.set("key1", "value1").unwrap();
    assert_eq!(storage.get("key1").unwrap(), Some("value1".to_string()));
}

#[wasm_bindgen_test]
fn memory_storage_overwrite() {
    let storage = MemoryStorage::new();
    storage.set("key", "v1").unwrap();
    storage.set("key", "v2").unwrap();
    assert_eq!(storage.get("key").unwrap(), Some("v2".to_string()));
}

#[wasm_bindgen_test]
fn memory_storage_remove() {
    let storage = MemoryStorage::new();
    storage.set("key", "val").unwrap();
    storage.remove("key").unwrap();
    assert!(storage.get("key").unwrap().is_none());
}

#[wasm_bindgen_test]
fn memory_storage_remove_nonexistent() {
    let storage = MemoryStorage::new();
    storage.remove("nonexistent").unwrap();
}

// ─── Backend Selection Tests ─────────────────────────────

#[wasm_bindgen_test]
fn local_storage_unavailable_without_window() {
    assert!(LocalStorage::open().is_err());
}

#[wasm_bindgen_test]
fn auto_detect_falls_back_to_memory() {
    let storage = auto_detect_storage(&StorageBackendType::Auto);
    assert_eq!(storage.backend_name(), "memory");
}

#[wasm_bindgen_test]
fn auto_detect_honours_memory_config() {
    let storage = auto_detect_storage(&StorageBackendType::Memory);
    assert_eq!(storage.backend_name(), "memory");
}

// ─── ConversationStore over MemoryStorage ────────────────

#[wasm_bindgen_test]
fn store_round_trip_over_memory() {
    let storage: Rc<dyn StoragePort> = Rc::new(MemoryStorage::new());
    let store = ConversationStore::new(storage.clone(), "conversations");

    let mut conv = Conversation::new("c1", Utc::now());
    conv.title = "Vaccination schedule".to_string();
    store.save(&[conv.clone()]);

    assert_eq!(store.load(), vec![conv]);
    assert!(storage.get("conversations").unwrap().is_some());
}

#[wasm_bindgen_test]
fn store_clears_corrupt_slot() {
    let storage: Rc<dyn StoragePort> = Rc::new(MemoryStorage::new());
    storage.set("conversations", "[{\"id\": 1}]").unwrap();
    let store = ConversationStore::new(storage.clone(), "conversations");

    assert!(store.load().is_empty());
    assert!(storage.get("conversations").unwrap().is_none());
}

// ─── HttpGateway Tests ───────────────────────────────────

#[wasm_bindgen_test]
fn gateway_keeps_config() {
    let config = ApiConfig {
        base_url: "https://api.example.org/".to_string(),
        ..ApiConfig::default()
    };
    let gateway = HttpGateway::new(config);
    assert_eq!(gateway.config().chat_url(), "https://api.example.org/chat-groq/");
    assert_eq!(
        gateway.config().conversation_url("42"),
        "https://api.example.org/conversations/42/"
    );
}

// ─── Status Mapping Tests ────────────────────────────────

#[wasm_bindgen_test]
fn status_2xx_passes() {
    assert!(check_status(200, "OK", "{}", None).is_ok());
    assert!(check_status(204, "No Content", "", Some("42")).is_ok());
}

#[wasm_bindgen_test]
fn status_404_for_named_resource_is_not_found() {
    assert_eq!(
        check_status(404, "Not Found", "", Some("42")),
        Err(ChatError::NotFound("42".to_string()))
    );
}

#[wasm_bindgen_test]
fn status_404_for_collection_is_server_error() {
    assert_eq!(
        check_status(404, "Not Found", "  ", None),
        Err(ChatError::Server {
            status: 404,
            message: "Not Found".to_string()
        })
    );
}

#[wasm_bindgen_test]
fn status_5xx_carries_body() {
    let err = check_status(502, "Bad Gateway", "upstream timed out", Some("42")).unwrap_err();
    assert_eq!(
        err,
        ChatError::Server {
            status: 502,
            message: "upstream timed out".to_string()
        }
    );
    assert!(err.is_transport());
}

#[wasm_bindgen_test]
fn body_that_does_not_decode_is_serialization_error() {
    let err = parse_body::<ConversationList>("<html>oops</html>").unwrap_err();
    assert!(matches!(err, ChatError::Serialization(_)));
    assert!(!err.is_transport());
}

#[wasm_bindgen_test]
fn body_decodes_conversation_list() {
    let list: ConversationList =
        parse_body(r#"{"conversations": [{"id": 7, "title": "Allergies"}]}"#).unwrap();
    assert_eq!(list.conversations.len(), 1);
    assert_eq!(list.conversations[0].id.to_string(), "7");
}

// ─── RefreshTask Tests ───────────────────────────────────

#[wasm_bindgen_test]
fn refresh_period_is_clamped() {
    assert_eq!(period_millis(0), 0);
    assert_eq!(period_millis(300), 300_000);
    assert_eq!(period_millis(2_147_483), 2_147_483_000);
    assert_eq!(period_millis(2_147_484), MAX_PERIOD_MILLIS);
    assert_eq!(period_millis(u32::MAX), MAX_PERIOD_MILLIS);
    assert!(MAX_PERIOD_MILLIS as i32 > 0);
}

/// Counts list loads; `hang` keeps every load awaiting forever.
#[derive(Default)]
struct CountingGateway {
    loads: Cell<u32>,
    hang: bool,
}

#[async_trait(?Send)]
impl GatewayPort for CountingGateway {
    async fn fetch_conversation(&self, remote_id: &str) -> Result<RemoteConversation> {
        Err(ChatError::NotFound(remote_id.to_string()))
    }

    async fn fetch_conversations(&self) -> Result<Vec<RemoteConversationSummary>> {
        self.loads.set(self.loads.get() + 1);
        if self.hang {
            futures::future::pending::<()>().await;
        }
        Ok(Vec::new())
    }

    async fn send_message(&self, _content: &str, _conversation_id: Option<&str>) -> Result<ChatReply> {
        Err(ChatError::Network("not used".to_string()))
    }
}

fn refresh_repo() -> ConversationRepository {
    let storage: Rc<dyn StoragePort> = Rc::new(MemoryStorage::new());
    let clock: Rc<dyn ClockPort> = Rc::new(SystemClock);
    ConversationRepository::open(
        Rc::new(ConversationStore::new(storage, "conversations")),
        Rc::new(IdGenerator::new()),
        clock,
        EventBus::new(),
    )
}

fn start(gateway: &Rc<CountingGateway>, period_ms: u32) -> (RefreshTask, Rc<Cell<u32>>) {
    let done = Rc::new(Cell::new(0));
    let counter = done.clone();
    let on_done: Rc<dyn Fn(bool)> = Rc::new(move |ok| {
        assert!(ok);
        counter.set(counter.get() + 1);
    });
    let port: Rc<dyn GatewayPort> = gateway.clone();
    (RefreshTask::with_period(refresh_repo(), port, period_ms, on_done), done)
}

#[wasm_bindgen_test]
async fn refresh_loads_immediately() {
    let gateway = Rc::new(CountingGateway::default());
    let (task, done) = start(&gateway, 0);
    assert!(!task.is_running());

    TimeoutFuture::new(20).await;
    assert_eq!(gateway.loads.get(), 1);
    assert_eq!(done.get(), 1);

    TimeoutFuture::new(50).await;
    assert_eq!(gateway.loads.get(), 1);
}

#[wasm_bindgen_test]
async fn refresh_repeats_until_cancelled() {
    let gateway = Rc::new(CountingGateway::default());
    let (mut task, done) = start(&gateway, 25);
    assert!(task.is_running());

    TimeoutFuture::new(140).await;
    assert!(gateway.loads.get() >= 3, "got {} loads", gateway.loads.get());

    task.cancel();
    assert!(!task.is_running());
    TimeoutFuture::new(10).await;
    let settled = gateway.loads.get();
    TimeoutFuture::new(100).await;
    assert_eq!(gateway.loads.get(), settled);
    assert_eq!(done.get(), settled);
}

#[wasm_bindgen_test]
async fn refresh_stops_on_drop() {
    let gateway = Rc::new(CountingGateway::default());
    let (task, _done) = start(&gateway, 25);
    TimeoutFuture::new(60).await;
    drop(task);

    TimeoutFuture::new(10).await;
    let settled = gateway.loads.get();
    assert!(settled >= 2);
    TimeoutFuture::new(100).await;
    assert_eq!(gateway.loads.get(), settled);
}

#[wasm_bindgen_test]
async fn refresh_skips_ticks_while_a_load_is_in_flight() {
    let gateway = Rc::new(CountingGateway {
        hang: true,
        ..CountingGateway::default()
    });
    let (mut task, done) = start(&gateway, 20);

    TimeoutFuture::new(120).await;
    assert_eq!(gateway.loads.get(), 1);
    assert_eq!(done.get(), 0);
    task.cancel();
}
