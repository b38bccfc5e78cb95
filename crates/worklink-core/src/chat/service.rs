//! Chat service orchestrating durable sends, read receipts, and fan-out.
//!
//! `ChatService` is the single write path for chats: both the socket
//! gateway and the REST handlers call into it, so a message is
//! persisted, broadcast to its conversation room, and fanned out to
//! inbox rooms identically no matter which surface it entered through.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;
use worklink_types::chat::{Chat, ChatMessage, ChatSummary};
use worklink_types::error::ChatError;
use worklink_types::realtime::{NotificationKind, Room, ServerEvent};
use worklink_types::service::ServiceStatus;

use crate::chat::repository::ChatRepository;
use crate::realtime::fanout::{notification_targets, preview};
use crate::realtime::registry::RoomRegistry;

/// Orchestrates chat persistence and live delivery.
///
/// Generic over `ChatRepository` to maintain clean architecture
/// (worklink-core never depends on worklink-infra). Holds one async
/// mutex per chat so append and broadcast happen on a single writer
/// path: messages in a chat are delivered in the order they became
/// durable.
pub struct ChatService<R: ChatRepository> {
    repo: Arc<R>,
    registry: Arc<RoomRegistry>,
    /// Per-chat append locks (chat_id -> mutex).
    chat_locks: DashMap<Uuid, Arc<Mutex<()>>>,
    max_message_chars: usize,
}

impl<R: ChatRepository> ChatService<R> {
    /// Create a new chat service over a repository and room registry.
    pub fn new(repo: Arc<R>, registry: Arc<RoomRegistry>, max_message_chars: usize) -> Self {
        Self {
            repo,
            registry,
            chat_locks: DashMap::new(),
            max_message_chars,
        }
    }

    // --- Chat lifecycle ---

    /// Create a chat with a fixed participant set.
    ///
    /// Participants are deduplicated; at least one is required. Called
    /// when a service request is matched with a professional, or
    /// directly through the REST surface.
    pub async fn create_chat(
        &self,
        participants: Vec<Uuid>,
        service_request_id: Option<Uuid>,
    ) -> Result<Chat, ChatError> {
        let mut seen = HashSet::new();
        let participants: Vec<Uuid> = participants
            .into_iter()
            .filter(|id| seen.insert(*id))
            .collect();
        if participants.is_empty() {
            return Err(ChatError::InvalidParticipants(
                "at least one participant is required".to_string(),
            ));
        }

        let chat = Chat {
            id: Uuid::now_v7(),
            participants,
            service_request_id,
            created_at: Utc::now(),
            message_count: 0,
        };
        self.repo.create_chat(&chat).await?;
        info!(chat_id = %chat.id, participants = chat.participants.len(), "chat created");
        Ok(chat)
    }

    /// Get a chat by id.
    pub async fn get_chat(&self, chat_id: &Uuid) -> Result<Chat, ChatError> {
        self.repo
            .get_chat(chat_id)
            .await?
            .ok_or(ChatError::ChatNotFound)
    }

    /// List a user's chats, newest first, with last-message previews.
    pub async fn chats_for_user(&self, user_id: &Uuid) -> Result<Vec<ChatSummary>, ChatError> {
        Ok(self.repo.list_chats_for_user(user_id).await?)
    }

    /// Fetch a chat's message history, ordered oldest first.
    pub async fn history(
        &self,
        chat_id: &Uuid,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<ChatMessage>, ChatError> {
        // Distinguish "no messages yet" from "no such chat".
        self.get_chat(chat_id).await?;
        Ok(self.repo.get_messages(chat_id, limit, offset).await?)
    }

    // --- Sends ---

    /// Durably send a message and deliver its side effects.
    ///
    /// Validates content and sender, appends the message, broadcasts
    /// `new_message` to the conversation room, then fans a truncated
    /// `notification` out to every other participant's inbox room.
    /// Nothing is broadcast unless the append succeeded.
    pub async fn send_message(
        &self,
        chat_id: Uuid,
        sender_id: Uuid,
        content: &str,
    ) -> Result<ChatMessage, ChatError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ChatError::InvalidContent(
                "message content is empty".to_string(),
            ));
        }
        if content.chars().count() > self.max_message_chars {
            return Err(ChatError::InvalidContent(format!(
                "message content exceeds {} characters",
                self.max_message_chars
            )));
        }

        let chat = self
            .repo
            .get_chat(&chat_id)
            .await?
            .ok_or(ChatError::ChatNotFound)?;
        if !chat.has_participant(sender_id) {
            return Err(ChatError::NotParticipant);
        }

        let lock = self.chat_lock(chat_id);
        let _guard = lock.lock().await;

        let message = ChatMessage::new(chat_id, sender_id, content.to_string());
        self.repo.append_message(&message).await?;

        let watching = self.registry.broadcast(
            &Room::Chat(chat_id),
            &ServerEvent::NewMessage {
                message: message.clone(),
            },
        );

        let notification = ServerEvent::Notification {
            kind: NotificationKind::NewMessage,
            chat_id,
            sender_id,
            content: preview(&message.content),
            timestamp: message.sent_at,
        };
        let targets = notification_targets(&chat, sender_id);
        for target in &targets {
            self.registry
                .broadcast(&Room::User(*target), &notification);
        }

        debug!(
            chat_id = %chat_id,
            message_id = %message.id,
            watching,
            notified = targets.len(),
            "message sent"
        );
        Ok(message)
    }

    // --- Read receipts ---

    /// Mark a message read and notify its original sender.
    ///
    /// Returns `Ok(Some(read_at))` when this call performed the
    /// unread-to-read transition and `Ok(None)` when the message was
    /// already read: the transition is conditional in the store, so
    /// concurrent markers produce exactly one `message_read` receipt.
    pub async fn mark_as_read(
        &self,
        chat_id: Uuid,
        message_id: Uuid,
    ) -> Result<Option<DateTime<Utc>>, ChatError> {
        let message = self
            .repo
            .get_message(&chat_id, &message_id)
            .await?
            .ok_or(ChatError::MessageNotFound)?;
        if message.read {
            debug!(chat_id = %chat_id, message_id = %message_id, "message already read");
            return Ok(None);
        }

        let read_at = Utc::now();
        if !self
            .repo
            .mark_message_read(&chat_id, &message_id, read_at)
            .await?
        {
            // Lost the race; whoever won emitted the receipt.
            return Ok(None);
        }

        self.registry.broadcast(
            &Room::User(message.sender_id),
            &ServerEvent::MessageRead {
                chat_id,
                message_id,
                read_at,
            },
        );
        debug!(chat_id = %chat_id, message_id = %message_id, "message marked read");
        Ok(Some(read_at))
    }

    // --- Service updates ---

    /// Relay a service-request status change to a user's inbox room.
    ///
    /// Stateless: nothing is persisted, so an offline user simply
    /// misses the event. Returns the number of connections reached.
    pub fn service_update(&self, service_id: Uuid, user_id: Uuid, status: ServiceStatus) -> usize {
        let delivered = self.registry.broadcast(
            &Room::User(user_id),
            &ServerEvent::ServiceNotification {
                kind: NotificationKind::StatusUpdate,
                service_id,
                status,
                timestamp: Utc::now(),
            },
        );
        debug!(service_id = %service_id, user_id = %user_id, %status, delivered, "service update relayed");
        delivered
    }

    fn chat_lock(&self, chat_id: Uuid) -> Arc<Mutex<()>> {
        self.chat_locks.entry(chat_id).or_default().clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
