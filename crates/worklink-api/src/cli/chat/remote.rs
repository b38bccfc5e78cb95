//! REST client for the Worklink gateway.
//!
//! Thin reqwest wrapper over the `/api/v1` surface. Unwraps the envelope
//! format and surfaces the gateway's error messages as `anyhow` errors.

use anyhow::{Context, anyhow};
use serde::Deserialize;
use uuid::Uuid;

use worklink_types::chat::{Chat, ChatMessage, ChatSummary};

/// REST client bound to one gateway base URL.
pub struct RemoteApi {
    base_url: String,
    client: reqwest::Client,
}

/// Envelope wrapper as returned by the gateway.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<EnvelopeError>,
}

#[derive(Debug, Deserialize)]
struct EnvelopeError {
    code: String,
    message: String,
}

impl RemoteApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    /// WebSocket URL derived from the base URL (`http` -> `ws`).
    pub fn ws_url(&self) -> String {
        let host = if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            format!("ws://{}", self.base_url)
        };
        format!("{host}/ws")
    }

    /// GET /api/v1/users/{id}/chats
    pub async fn list_chats(&self, user_id: &Uuid) -> anyhow::Result<Vec<ChatSummary>> {
        let envelope = self
            .client
            .get(format!("{}/api/v1/users/{user_id}/chats", self.base_url))
            .send()
            .await
            .context("gateway unreachable")?
            .json::<Envelope<Vec<ChatSummary>>>()
            .await
            .context("malformed chat list response")?;
        unwrap_envelope(envelope)
    }

    /// GET /api/v1/chats/{id}
    pub async fn get_chat(&self, chat_id: &Uuid) -> anyhow::Result<Chat> {
        let envelope = self
            .client
            .get(format!("{}/api/v1/chats/{chat_id}", self.base_url))
            .send()
            .await
            .context("gateway unreachable")?
            .json::<Envelope<Chat>>()
            .await
            .context("malformed chat response")?;
        unwrap_envelope(envelope)
    }

    /// GET /api/v1/chats/{id}/messages
    pub async fn history(
        &self,
        chat_id: &Uuid,
        limit: Option<i64>,
    ) -> anyhow::Result<Vec<ChatMessage>> {
        let mut request = self
            .client
            .get(format!("{}/api/v1/chats/{chat_id}/messages", self.base_url));
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit)]);
        }
        let envelope = request
            .send()
            .await
            .context("gateway unreachable")?
            .json::<Envelope<Vec<ChatMessage>>>()
            .await
            .context("malformed history response")?;
        unwrap_envelope(envelope)
    }

    /// POST /api/v1/chats/{id}/messages - the durable send.
    pub async fn send_message(
        &self,
        chat_id: &Uuid,
        sender_id: &Uuid,
        content: &str,
    ) -> anyhow::Result<ChatMessage> {
        let envelope = self
            .client
            .post(format!("{}/api/v1/chats/{chat_id}/messages", self.base_url))
            .json(&serde_json::json!({
                "sender_id": sender_id,
                "content": content,
            }))
            .send()
            .await
            .context("gateway unreachable")?
            .json::<Envelope<ChatMessage>>()
            .await
            .context("malformed send response")?;
        unwrap_envelope(envelope)
    }
}

fn unwrap_envelope<T>(envelope: Envelope<T>) -> anyhow::Result<T> {
    if let Some(err) = envelope.errors.first() {
        return Err(anyhow!("{} ({})", err.message, err.code));
    }
    envelope
        .data
        .ok_or_else(|| anyhow!("envelope carried neither data nor errors"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ws_url_swaps_scheme() {
        assert_eq!(
            RemoteApi::new("http://127.0.0.1:3000").ws_url(),
            "ws://127.0.0.1:3000/ws"
        );
        assert_eq!(
            RemoteApi::new("https://worklink.example").ws_url(),
            "wss://worklink.example/ws"
        );
        // Trailing slash is normalized away
        assert_eq!(
            RemoteApi::new("http://localhost:3000/").ws_url(),
            "ws://localhost:3000/ws"
        );
    }

    #[test]
    fn envelope_with_errors_becomes_err() {
        let envelope: Envelope<Chat> = serde_json::from_str(
            r#"{"data": null, "meta": {"request_id": "r", "timestamp": "t", "response_time_ms": 1},
                "errors": [{"code": "CHAT_NOT_FOUND", "message": "Chat not found"}]}"#,
        )
        .unwrap();
        let err = unwrap_envelope(envelope).unwrap_err();
        assert!(err.to_string().contains("CHAT_NOT_FOUND"));
    }

    #[test]
    fn envelope_with_data_unwraps() {
        let envelope: Envelope<Vec<ChatMessage>> = serde_json::from_str(
            r#"{"data": [], "meta": {"request_id": "r", "timestamp": "t", "response_time_ms": 1}}"#,
        )
        .unwrap();
        assert!(unwrap_envelope(envelope).unwrap().is_empty());
    }
}
