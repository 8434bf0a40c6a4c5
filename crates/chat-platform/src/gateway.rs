//! HTTP adapter for the chat backend.
//!
//! Uses browser `fetch()` via gloo-net for WASM compatibility. Any non-2xx
//! status is an error; a body that does not decode is a `Serialization`
//! error, kept apart from transport failures.

use async_trait::async_trait;
use gloo_net::http::{Request, Response};
use serde::de::DeserializeOwned;

use chat_core::ports::GatewayPort;
use chat_types::{
    ChatError, Result,
    config::ApiConfig,
    wire::{ChatReply, ConversationList, RemoteConversation, RemoteConversationSummary, SendMessageRequest},
};

pub struct HttpGateway {
    config: ApiConfig,
}

impl HttpGateway {
    pub fn new(config: ApiConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }
}

#[async_trait(?Send)]
impl GatewayPort for HttpGateway {
    async fn fetch_conversation(&self, remote_id: &str) -> Result<RemoteConversation> {
        let url = self.config.conversation_url(remote_id);
        let response = Request::get(&url)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| ChatError::Network(e.to_string()))?;

        read(response, Some(remote_id)).await
    }

    async fn fetch_conversations(&self) -> Result<Vec<RemoteConversationSummary>> {
        let url = self.config.conversations_url();
        let response = Request::get(&url)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| ChatError::Network(e.to_string()))?;

        let list: ConversationList = read(response, None).await?;
        Ok(list.conversations)
    }

    async fn send_message(
        &self,
        content: &str,
        conversation_id: Option<&str>,
    ) -> Result<ChatReply> {
        let body = SendMessageRequest {
            message: content.to_string(),
            conversation_id: conversation_id.map(String::from),
        };

        let response = Request::post(&self.config.chat_url())
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .json(&body)
            .map_err(|e| ChatError::Serialization(e.to_string()))?
            .send()
            .await
            .map_err(|e| ChatError::Network(e.to_string()))?;

        read(response, None).await
    }
}

/// Map a response status to an error. A 404 is `NotFound` when `resource`
/// names what was asked for; other non-2xx statuses are `Server`, carrying
/// the body or, when it is blank, the status text.
pub fn check_status(
    status: u16,
    status_text: &str,
    body: &str,
    resource: Option<&str>,
) -> Result<()> {
    if (200..300).contains(&status) {
        return Ok(());
    }
    if let (404, Some(resource)) = (status, resource) {
        return Err(ChatError::NotFound(resource.to_string()));
    }
    let message = if body.trim().is_empty() { status_text } else { body };
    Err(ChatError::Server {
        status,
        message: message.to_string(),
    })
}

/// Decode a successful response body.
pub fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| ChatError::Serialization(e.to_string()))
}

async fn read<T: DeserializeOwned>(response: Response, resource: Option<&str>) -> Result<T> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ChatError::Network(e.to_string()))?;
    check_status(status, &response.status_text(), &body, resource)?;
    parse_body(&body)
}
