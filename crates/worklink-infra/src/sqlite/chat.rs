//! SQLite chat repository implementation.
//!
//! Implements `ChatRepository` from `worklink-core` using sqlx with split
//! read/write pools: raw queries, private Row structs, reads on the
//! reader pool, writes serialized through the single-connection writer.

use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;
use worklink_core::chat::repository::ChatRepository;
use worklink_types::chat::{Chat, ChatMessage, ChatSummary};
use worklink_types::error::RepositoryError;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `ChatRepository`.
pub struct SqliteChatRepository {
    pool: DatabasePool,
}

impl SqliteChatRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    async fn load_participants(&self, chat_id: &Uuid) -> Result<Vec<Uuid>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT user_id FROM chat_participants WHERE chat_id = ? ORDER BY rowid ASC",
        )
        .bind(chat_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut participants = Vec::with_capacity(rows.len());
        for row in &rows {
            let user_id: String = row
                .try_get("user_id")
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            participants.push(
                Uuid::parse_str(&user_id)
                    .map_err(|e| RepositoryError::Query(format!("invalid user_id: {e}")))?,
            );
        }
        Ok(participants)
    }

    async fn last_message(&self, chat_id: &Uuid) -> Result<Option<ChatMessage>, RepositoryError> {
        let row = sqlx::query(
            "SELECT * FROM chat_messages WHERE chat_id = ? ORDER BY sent_at DESC, id DESC LIMIT 1",
        )
        .bind(chat_id.to_string())
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let msg_row = ChatMessageRow::from_row(&row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(msg_row.into_message()?))
            }
            None => Ok(None),
        }
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

/// Internal row type for mapping SQLite rows to domain Chat.
struct ChatRow {
    id: String,
    service_request_id: Option<String>,
    message_count: i64,
    created_at: String,
}

impl ChatRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            service_request_id: row.try_get("service_request_id")?,
            message_count: row.try_get("message_count")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_chat(self, participants: Vec<Uuid>) -> Result<Chat, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid chat id: {e}")))?;
        let service_request_id = self
            .service_request_id
            .as_deref()
            .map(Uuid::parse_str)
            .transpose()
            .map_err(|e| RepositoryError::Query(format!("invalid service_request_id: {e}")))?;
        let created_at = parse_datetime(&self.created_at)?;

        Ok(Chat {
            id,
            participants,
            service_request_id,
            created_at,
            message_count: self.message_count as u32,
        })
    }
}

/// Internal row type for mapping SQLite rows to domain ChatMessage.
struct ChatMessageRow {
    id: String,
    chat_id: String,
    sender_id: String,
    content: String,
    sent_at: String,
    read: i64,
    read_at: Option<String>,
}

impl ChatMessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            chat_id: row.try_get("chat_id")?,
            sender_id: row.try_get("sender_id")?,
            content: row.try_get("content")?,
            sent_at: row.try_get("sent_at")?,
            read: row.try_get("read")?,
            read_at: row.try_get("read_at")?,
        })
    }

    fn into_message(self) -> Result<ChatMessage, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid message id: {e}")))?;
        let chat_id = Uuid::parse_str(&self.chat_id)
            .map_err(|e| RepositoryError::Query(format!("invalid chat_id: {e}")))?;
        let sender_id = Uuid::parse_str(&self.sender_id)
            .map_err(|e| RepositoryError::Query(format!("invalid sender_id: {e}")))?;
        let sent_at = parse_datetime(&self.sent_at)?;
        let read_at = self.read_at.as_deref().map(parse_datetime).transpose()?;

        Ok(ChatMessage {
            id,
            chat_id,
            sender_id,
            content: self.content,
            sent_at,
            read: self.read != 0,
            read_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

// ---------------------------------------------------------------------------
// ChatRepository implementation
// ---------------------------------------------------------------------------

impl ChatRepository for SqliteChatRepository {
    async fn create_chat(&self, chat: &Chat) -> Result<(), RepositoryError> {
        let mut tx = self
            .pool
            .writer
            .begin()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        sqlx::query(
            r#"INSERT INTO chats (id, service_request_id, message_count, created_at)
               VALUES (?, ?, ?, ?)"#,
        )
        .bind(chat.id.to_string())
        .bind(chat.service_request_id.map(|id| id.to_string()))
        .bind(chat.message_count as i64)
        .bind(format_datetime(&chat.created_at))
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        for participant in &chat.participants {
            sqlx::query("INSERT INTO chat_participants (chat_id, user_id) VALUES (?, ?)")
                .bind(chat.id.to_string())
                .bind(participant.to_string())
                .execute(&mut *tx)
                .await
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        Ok(())
    }

    async fn get_chat(&self, chat_id: &Uuid) -> Result<Option<Chat>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM chats WHERE id = ?")
            .bind(chat_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let chat_row =
                    ChatRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
                let participants = self.load_participants(chat_id).await?;
                Ok(Some(chat_row.into_chat(participants)?))
            }
            None => Ok(None),
        }
    }

    async fn list_chats_for_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<ChatSummary>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT c.* FROM chats c
               JOIN chat_participants p ON p.chat_id = c.id
               WHERE p.user_id = ?
               ORDER BY c.created_at DESC"#,
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut summaries = Vec::with_capacity(rows.len());
        for row in &rows {
            let chat_row =
                ChatRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            let chat_id = Uuid::parse_str(&chat_row.id)
                .map_err(|e| RepositoryError::Query(format!("invalid chat id: {e}")))?;
            let participants = self.load_participants(&chat_id).await?;
            let last_message = self.last_message(&chat_id).await?;
            summaries.push(ChatSummary {
                chat: chat_row.into_chat(participants)?,
                last_message,
            });
        }

        Ok(summaries)
    }

    async fn append_message(&self, message: &ChatMessage) -> Result<(), RepositoryError> {
        // Insert the message
        sqlx::query(
            r#"INSERT INTO chat_messages (id, chat_id, sender_id, content, sent_at, read, read_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(message.id.to_string())
        .bind(message.chat_id.to_string())
        .bind(message.sender_id.to_string())
        .bind(&message.content)
        .bind(format_datetime(&message.sent_at))
        .bind(message.read as i64)
        .bind(message.read_at.as_ref().map(format_datetime))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        // Increment message_count on the chat
        sqlx::query("UPDATE chats SET message_count = message_count + 1 WHERE id = ?")
            .bind(message.chat_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn get_message(
        &self,
        chat_id: &Uuid,
        message_id: &Uuid,
    ) -> Result<Option<ChatMessage>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM chat_messages WHERE chat_id = ? AND id = ?")
            .bind(chat_id.to_string())
            .bind(message_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let msg_row = ChatMessageRow::from_row(&row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(msg_row.into_message()?))
            }
            None => Ok(None),
        }
    }

    async fn get_messages(
        &self,
        chat_id: &Uuid,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let mut sql = String::from(
            "SELECT * FROM chat_messages WHERE chat_id = ? ORDER BY sent_at ASC, id ASC",
        );

        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        } else if offset.is_some() {
            // SQLite only accepts OFFSET after a LIMIT; -1 is unbounded.
            sql.push_str(" LIMIT -1");
        }
        if let Some(offset) = offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }

        let rows = sqlx::query(&sql)
            .bind(chat_id.to_string())
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in &rows {
            let msg_row =
                ChatMessageRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            messages.push(msg_row.into_message()?);
        }

        Ok(messages)
    }

    async fn mark_message_read(
        &self,
        chat_id: &Uuid,
        message_id: &Uuid,
        read_at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        // Conditional on read = 0 so concurrent markers transition at
        // most once between them.
        let result = sqlx::query(
            r#"UPDATE chat_messages SET read = 1, read_at = ?
               WHERE chat_id = ? AND id = ? AND read = 0"#,
        )
        .bind(format_datetime(&read_at))
        .bind(chat_id.to_string())
        .bind(message_id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn message_count(&self, chat_id: &Uuid) -> Result<u32, RepositoryError> {
        let row = sqlx::query("SELECT COUNT(*) as cnt FROM chat_messages WHERE chat_id = ?")
            .bind(chat_id.to_string())
            .fetch_one(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let count: i64 = row
            .try_get("cnt")
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(count as u32)
    }
}
