//! ChatRepository trait definition.
//!
//! Provides persistence operations for chats and their messages. Chats
//! are append-only: messages are inserted, never updated or removed,
//! except for the one-way read transition.

use uuid::Uuid;
use worklink_types::chat::{Chat, ChatMessage, ChatSummary};
use worklink_types::error::RepositoryError;

use chrono::{DateTime, Utc};

/// Repository trait for chat and message persistence.
///
/// Implementations live in worklink-infra (e.g., `SqliteChatRepository`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait ChatRepository: Send + Sync {
    /// Create a new chat with its participant set.
    fn create_chat(
        &self,
        chat: &Chat,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Get a chat by its unique ID, including its participants.
    fn get_chat(
        &self,
        chat_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Chat>, RepositoryError>> + Send;

    /// List the chats a user participates in, newest first, each with
    /// its most recent message.
    fn list_chats_for_user(
        &self,
        user_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<ChatSummary>, RepositoryError>> + Send;

    /// Append a message to its chat and bump the chat's message count.
    fn append_message(
        &self,
        message: &ChatMessage,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Get a single message within a chat.
    fn get_message(
        &self,
        chat_id: &Uuid,
        message_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<ChatMessage>, RepositoryError>> + Send;

    /// Get messages for a chat, ordered by sent_at ASC.
    fn get_messages(
        &self,
        chat_id: &Uuid,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> impl std::future::Future<Output = Result<Vec<ChatMessage>, RepositoryError>> + Send;

    /// Flip a message from unread to read at `read_at`.
    ///
    /// Returns `true` when this call performed the transition and
    /// `false` when the message was already read (or does not exist),
    /// so concurrent markers race safely and the caller can suppress
    /// duplicate receipts.
    fn mark_message_read(
        &self,
        chat_id: &Uuid,
        message_id: &Uuid,
        read_at: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// Get the total number of messages in a chat.
    fn message_count(
        &self,
        chat_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<u32, RepositoryError>> + Send;
}
