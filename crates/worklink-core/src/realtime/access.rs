//! Authorization seam for conversation rooms.
//!
//! The gateway consults `ChatAccess` before honoring a `join_chat`, so
//! policy is injectable rather than buried in the socket handler.

use std::sync::Arc;

use uuid::Uuid;
use worklink_types::error::RepositoryError;

use crate::chat::repository::ChatRepository;

/// Decides whether a user may join a chat's conversation room.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait ChatAccess: Send + Sync {
    /// Whether `user_id` may join the room for `chat_id`.
    ///
    /// An `Ok(false)` is a policy denial; an `Err` is a lookup failure
    /// and the caller decides how loudly to surface it.
    fn can_join_chat(
        &self,
        user_id: &Uuid,
        chat_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;
}

/// Default policy: a user may join exactly the chats they participate in.
pub struct ParticipantAccess<R> {
    repo: Arc<R>,
}

impl<R> ParticipantAccess<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }
}

impl<R: ChatRepository> ChatAccess for ParticipantAccess<R> {
    async fn can_join_chat(
        &self,
        user_id: &Uuid,
        chat_id: &Uuid,
    ) -> Result<bool, RepositoryError> {
        // A missing chat answers "no" rather than erroring, so probing a
        // chat id cannot distinguish absent from foreign.
        Ok(self
            .repo
            .get_chat(chat_id)
            .await?
            .is_some_and(|chat| chat.has_participant(*user_id)))
    }
}
