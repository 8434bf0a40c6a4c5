use serde::{Deserialize, Serialize};

/// Top-level client configuration.
///
/// Every section defaults, so a host may pass a partial JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api: ApiConfig,
    pub storage: StorageConfig,
    /// Period of the background `load_all`; `0` disables it
    pub refresh_interval_secs: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            storage: StorageConfig::default(),
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
        }
    }
}

pub const DEFAULT_REFRESH_INTERVAL_SECS: u32 = 5 * 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub chat_endpoint: String,
    pub conversations_endpoint: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            chat_endpoint: "/chat-groq/".to_string(),
            conversations_endpoint: "/conversations/".to_string(),
        }
    }
}

impl ApiConfig {
    pub fn chat_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.chat_endpoint)
    }

    pub fn conversations_url(&self) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            self.conversations_endpoint
        )
    }

    /// `GET` target for a single conversation, e.g. `/conversations/42/`
    pub fn conversation_url(&self, remote_id: &str) -> String {
        format!("{}{}/", self.conversations_url(), remote_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackendType,
    /// Key of the durable slot holding the conversation list
    pub key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackendType::Auto,
            key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

pub const DEFAULT_STORAGE_KEY: &str = "high5-conversations";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageBackendType {
    /// Auto-detect best available backend
    Auto,
    Memory,
    LocalStorage,
}
