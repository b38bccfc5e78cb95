//! In-memory `ChatRepository` for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use uuid::Uuid;
use worklink_types::chat::{Chat, ChatMessage, ChatSummary};
use worklink_types::error::RepositoryError;

use super::repository::ChatRepository;

/// Test double backed by plain maps, with injectable append failures.
#[derive(Default)]
pub(crate) struct InMemoryChatRepository {
    chats: Mutex<HashMap<Uuid, Chat>>,
    messages: Mutex<HashMap<Uuid, Vec<ChatMessage>>>,
    fail_appends: AtomicBool,
}

impl InMemoryChatRepository {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `append_message` fail.
    pub(crate) fn fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }
}

impl ChatRepository for InMemoryChatRepository {
    async fn create_chat(&self, chat: &Chat) -> Result<(), RepositoryError> {
        let mut chats = self.chats.lock().unwrap();
        if chats.contains_key(&chat.id) {
            return Err(RepositoryError::Conflict(format!(
                "chat {} already exists",
                chat.id
            )));
        }
        chats.insert(chat.id, chat.clone());
        Ok(())
    }

    async fn get_chat(&self, chat_id: &Uuid) -> Result<Option<Chat>, RepositoryError> {
        Ok(self.chats.lock().unwrap().get(chat_id).cloned())
    }

    async fn list_chats_for_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<ChatSummary>, RepositoryError> {
        let chats = self.chats.lock().unwrap();
        let messages = self.messages.lock().unwrap();
        let mut summaries: Vec<ChatSummary> = chats
            .values()
            .filter(|chat| chat.has_participant(*user_id))
            .map(|chat| ChatSummary {
                chat: chat.clone(),
                last_message: messages
                    .get(&chat.id)
                    .and_then(|msgs| msgs.last().cloned()),
            })
            .collect();
        summaries.sort_by(|a, b| b.chat.created_at.cmp(&a.chat.created_at));
        Ok(summaries)
    }

    async fn append_message(&self, message: &ChatMessage) -> Result<(), RepositoryError> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(RepositoryError::Query("injected append failure".to_string()));
        }
        let mut chats = self.chats.lock().unwrap();
        let chat = chats
            .get_mut(&message.chat_id)
            .ok_or(RepositoryError::NotFound)?;
        chat.message_count += 1;
        self.messages
            .lock()
            .unwrap()
            .entry(message.chat_id)
            .or_default()
            .push(message.clone());
        Ok(())
    }

    async fn get_message(
        &self,
        chat_id: &Uuid,
        message_id: &Uuid,
    ) -> Result<Option<ChatMessage>, RepositoryError> {
        Ok(self
            .messages
            .lock()
            .unwrap()
            .get(chat_id)
            .and_then(|msgs| msgs.iter().find(|m| m.id == *message_id).cloned()))
    }

    async fn get_messages(
        &self,
        chat_id: &Uuid,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let messages = self.messages.lock().unwrap();
        let msgs = messages.get(chat_id).cloned().unwrap_or_default();
        let offset = offset.unwrap_or(0).max(0) as usize;
        let limit = limit.map_or(usize::MAX, |l| l.max(0) as usize);
        Ok(msgs.into_iter().skip(offset).take(limit).collect())
    }

    async fn mark_message_read(
        &self,
        chat_id: &Uuid,
        message_id: &Uuid,
        read_at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let mut messages = self.messages.lock().unwrap();
        let Some(msg) = messages
            .get_mut(chat_id)
            .and_then(|msgs| msgs.iter_mut().find(|m| m.id == *message_id))
        else {
            return Ok(false);
        };
        if msg.read {
            return Ok(false);
        }
        msg.mark_read(read_at);
        Ok(true)
    }

    async fn message_count(&self, chat_id: &Uuid) -> Result<u32, RepositoryError> {
        Ok(self
            .chats
            .lock()
            .unwrap()
            .get(chat_id)
            .map_or(0, |chat| chat.message_count))
    }
}
