use thiserror::Error;

/// Errors from chat operations.
///
/// The gateway decides per operation which of these reach the client as
/// an `error` event and which are silent no-ops.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("chat not found")]
    ChatNotFound,

    #[error("message not found")]
    MessageNotFound,

    #[error("invalid message content: {0}")]
    InvalidContent(String),

    #[error("invalid participants: {0}")]
    InvalidParticipants(String),

    #[error("sender is not a participant of this chat")]
    NotParticipant,

    #[error("persistence failure: {0}")]
    Persistence(#[from] RepositoryError),
}

/// Errors from repository operations (used by trait definitions in
/// worklink-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}
