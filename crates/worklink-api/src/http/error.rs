//! Application error type mapping to HTTP status codes and envelope format.

use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use worklink_types::error::ChatError;

use crate::http::response::ApiResponse;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Chat domain errors.
    Chat(ChatError),
    /// Validation error (malformed path or body).
    Validation(String),
    /// Generic internal error.
    Internal(String),
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        AppError::Chat(e)
    }
}

impl AppError {
    /// Machine-readable code and human-readable message for this error.
    fn code_and_message(&self) -> (&'static str, String) {
        match self {
            AppError::Chat(ChatError::ChatNotFound) => ("CHAT_NOT_FOUND", "Chat not found".into()),
            AppError::Chat(ChatError::MessageNotFound) => {
                ("MESSAGE_NOT_FOUND", "Message not found".into())
            }
            AppError::Chat(e @ ChatError::InvalidContent(_)) => ("VALIDATION_ERROR", e.to_string()),
            AppError::Chat(e @ ChatError::InvalidParticipants(_)) => {
                ("VALIDATION_ERROR", e.to_string())
            }
            AppError::Chat(e @ ChatError::NotParticipant) => ("VALIDATION_ERROR", e.to_string()),
            AppError::Chat(e @ ChatError::Persistence(_)) => ("STORAGE_ERROR", e.to_string()),
            AppError::Validation(msg) => ("VALIDATION_ERROR", msg.clone()),
            AppError::Internal(msg) => ("INTERNAL_ERROR", msg.clone()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (code, message) = self.code_and_message();
        ApiResponse::error(code, &message, Uuid::now_v7().to_string()).into_response()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use worklink_types::error::RepositoryError;

    #[test]
    fn chat_not_found_maps_to_404() {
        let resp = AppError::Chat(ChatError::ChatNotFound).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn message_not_found_maps_to_404() {
        let resp = AppError::Chat(ChatError::MessageNotFound).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn invalid_content_maps_to_400() {
        let resp =
            AppError::Chat(ChatError::InvalidContent("empty".to_string())).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn non_participant_maps_to_400() {
        let resp = AppError::Chat(ChatError::NotParticipant).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn persistence_maps_to_500() {
        let err = ChatError::Persistence(RepositoryError::Query("disk full".to_string()));
        let resp = AppError::Chat(err).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn validation_maps_to_400() {
        let resp = AppError::Validation("Invalid UUID: xyz".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
