//! Chat and message types for Worklink.
//!
//! These types model conversations between marketplace users (clients and
//! professionals): the chat with its fixed participant set, and the
//! append-only messages inside it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A conversation between a fixed set of users.
///
/// The participant set is immutable after creation and always contains at
/// least one user id. Chats created for a service request carry its id so
/// clients can link the conversation back to the job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: Uuid,
    pub participants: Vec<Uuid>,
    pub service_request_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    /// Denormalized count of messages in this chat.
    pub message_count: u32,
}

impl Chat {
    /// Whether `user_id` belongs to this chat's participant set.
    pub fn has_participant(&self, user_id: Uuid) -> bool {
        self.participants.contains(&user_id)
    }
}

/// A single message within a chat.
///
/// Messages are ordered by `sent_at` within a chat and never removed.
/// The read flag is the only field that changes after creation, and
/// `read_at` is present exactly when `read` is true (mirrored by the
/// CHECK constraint in the SQLite schema).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub sent_at: DateTime<Utc>,
    pub read: bool,
    pub read_at: Option<DateTime<Utc>>,
}

impl ChatMessage {
    /// Builds an unread message with a fresh time-sortable id.
    pub fn new(chat_id: Uuid, sender_id: Uuid, content: String) -> Self {
        Self {
            id: Uuid::now_v7(),
            chat_id,
            sender_id,
            content,
            sent_at: Utc::now(),
            read: false,
            read_at: None,
        }
    }

    /// Marks the message read at `read_at`, keeping the flag and the
    /// timestamp in lockstep.
    pub fn mark_read(&mut self, read_at: DateTime<Utc>) {
        self.read = true;
        self.read_at = Some(read_at);
    }
}

/// A chat together with its most recent message, for conversation lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSummary {
    pub chat: Chat,
    pub last_message: Option<ChatMessage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_participant() {
        let alice = Uuid::now_v7();
        let bob = Uuid::now_v7();
        let chat = Chat {
            id: Uuid::now_v7(),
            participants: vec![alice, bob],
            service_request_id: None,
            created_at: Utc::now(),
            message_count: 0,
        };
        assert!(chat.has_participant(alice));
        assert!(!chat.has_participant(Uuid::now_v7()));
    }

    #[test]
    fn test_new_message_is_unread() {
        let msg = ChatMessage::new(Uuid::now_v7(), Uuid::now_v7(), "Hello".to_string());
        assert!(!msg.read);
        assert!(msg.read_at.is_none());
    }

    #[test]
    fn test_mark_read_pairs_flag_and_timestamp() {
        let mut msg = ChatMessage::new(Uuid::now_v7(), Uuid::now_v7(), "Hello".to_string());
        let at = Utc::now();
        msg.mark_read(at);
        assert!(msg.read);
        assert_eq!(msg.read_at, Some(at));
    }

    #[test]
    fn test_chat_serialize() {
        let chat = Chat {
            id: Uuid::now_v7(),
            participants: vec![Uuid::now_v7()],
            service_request_id: Some(Uuid::now_v7()),
            created_at: Utc::now(),
            message_count: 3,
        };
        let json = serde_json::to_string(&chat).unwrap();
        assert!(json.contains("\"message_count\":3"));
        assert!(json.contains("\"service_request_id\""));
    }
}
