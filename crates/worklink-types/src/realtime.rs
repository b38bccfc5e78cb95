//! Wire events and room addressing for the realtime channel.
//!
//! `ClientEvent` and `ServerEvent` are the closed vocabularies exchanged
//! over the WebSocket: every frame is JSON with an `event` tag, and
//! anything that does not parse into these enums is rejected at the
//! boundary. All variants are Clone + Send + Sync for fan-out over
//! per-connection channels.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;

use crate::chat::ChatMessage;
use crate::service::ServiceStatus;

/// A logical broadcast group on the realtime channel.
///
/// Every identified connection sits in its user's inbox room; joining a
/// conversation adds it to that chat's room. The `Display` form
/// (`user_<uuid>` / `chat_<uuid>`) is the canonical room name used in
/// logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Room {
    User(Uuid),
    Chat(Uuid),
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Room::User(id) => write!(f, "user_{id}"),
            Room::Chat(id) => write!(f, "chat_{id}"),
        }
    }
}

/// Events a client sends to the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Identify this connection and join the user's inbox room.
    Join { user_id: Uuid },

    /// Join a conversation room, subject to authorization.
    JoinChat { chat_id: Uuid },

    /// Leave a conversation room.
    LeaveChat { chat_id: Uuid },

    /// Send a message into a chat.
    SendMessage {
        chat_id: Uuid,
        sender_id: Uuid,
        content: String,
    },

    /// Relay a service-request status change to a user's inbox room.
    ServiceUpdate {
        service_id: Uuid,
        user_id: Uuid,
        status: ServiceStatus,
    },

    /// Mark a message in a chat as read.
    MarkAsRead { chat_id: Uuid, message_id: Uuid },
}

/// Discriminates the notification payloads pushed to inbox rooms.
///
/// Serialized under the `type` key inside notification events, next to
/// the outer `event` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewMessage,
    StatusUpdate,
}

/// Events the gateway pushes to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServerEvent {
    /// A message was appended to a chat this connection has joined.
    NewMessage { message: ChatMessage },

    /// Inbox notification: a new message arrived in one of the user's
    /// chats. `content` is truncated to a preview when long.
    Notification {
        #[serde(rename = "type")]
        kind: NotificationKind,
        chat_id: Uuid,
        sender_id: Uuid,
        content: String,
        timestamp: DateTime<Utc>,
    },

    /// Inbox notification: a service request changed status.
    ServiceNotification {
        #[serde(rename = "type")]
        kind: NotificationKind,
        service_id: Uuid,
        status: ServiceStatus,
        timestamp: DateTime<Utc>,
    },

    /// A message this user sent was read; delivered to the sender's
    /// inbox room only on the unread-to-read transition.
    MessageRead {
        chat_id: Uuid,
        message_id: Uuid,
        read_at: DateTime<Utc>,
    },

    /// A request on this connection failed. Never broadcast.
    Error { message: String },
}

impl ServerEvent {
    /// Shorthand for the error event sent back to an acting connection.
    pub fn error(message: impl Into<String>) -> Self {
        ServerEvent::Error {
            message: message.into(),
        }
    }
}
