//! Chat REST handlers.
//!
//! Endpoints:
//! - POST /api/v1/chats                      - Create a chat
//! - GET  /api/v1/users/{id}/chats           - List a user's chats, newest first
//! - GET  /api/v1/chats/{id}                 - Get a single chat
//! - GET  /api/v1/chats/{id}/messages        - Ordered message history
//! - POST /api/v1/chats/{id}/messages        - Durable send through the shared pipeline
//!
//! A message posted here goes through the same `ChatService` path as a
//! socket `send_message`, so watchers of the chat room receive the
//! `new_message` broadcast and other participants get their inbox
//! notification regardless of which surface the sender used.

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use uuid::Uuid;

use worklink_infra::config::resolve_page_limit;
use worklink_types::chat::{Chat, ChatMessage, ChatSummary};

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Request body for chat creation.
#[derive(Debug, Deserialize)]
pub struct CreateChatRequest {
    pub participants: Vec<Uuid>,
    #[serde(default)]
    pub service_request_id: Option<Uuid>,
}

/// Request body for a durable send.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub sender_id: Uuid,
    pub content: String,
}

/// Query parameters for message listing.
#[derive(Debug, Deserialize)]
pub struct MessageListQuery {
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

/// Parse a UUID from a path parameter, returning a 400 error on invalid format.
fn parse_uuid(s: &str) -> Result<Uuid, AppError> {
    s.parse::<Uuid>()
        .map_err(|_| AppError::Validation(format!("Invalid UUID: {s}")))
}

/// POST /api/v1/chats - Create a chat between participants.
pub async fn create_chat(
    State(state): State<AppState>,
    Json(req): Json<CreateChatRequest>,
) -> Result<Json<ApiResponse<Chat>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let chat = state
        .chat_service
        .create_chat(req.participants, req.service_request_id)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;

    let resp = ApiResponse::success(chat.clone(), request_id, elapsed)
        .with_link("self", &format!("/api/v1/chats/{}", chat.id))
        .with_link("messages", &format!("/api/v1/chats/{}/messages", chat.id));

    Ok(Json(resp))
}

/// GET /api/v1/users/{id}/chats - List chat summaries for a user.
pub async fn list_chats(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<ChatSummary>>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let uid = parse_uuid(&user_id)?;
    let summaries = state.chat_service.chats_for_user(&uid).await?;

    let elapsed = start.elapsed().as_millis() as u64;

    let resp = ApiResponse::success(summaries, request_id, elapsed)
        .with_link("self", &format!("/api/v1/users/{user_id}/chats"));

    Ok(Json(resp))
}

/// GET /api/v1/chats/{id} - Get a chat by ID.
pub async fn get_chat(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
) -> Result<Json<ApiResponse<Chat>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let cid = parse_uuid(&chat_id)?;
    let chat = state.chat_service.get_chat(&cid).await?;

    let elapsed = start.elapsed().as_millis() as u64;

    let resp = ApiResponse::success(chat, request_id, elapsed)
        .with_link("self", &format!("/api/v1/chats/{chat_id}"))
        .with_link("messages", &format!("/api/v1/chats/{chat_id}/messages"));

    Ok(Json(resp))
}

/// GET /api/v1/chats/{id}/messages - Ordered message history.
pub async fn get_messages(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
    Query(query): Query<MessageListQuery>,
) -> Result<Json<ApiResponse<Vec<ChatMessage>>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let cid = parse_uuid(&chat_id)?;
    let limit = resolve_page_limit(&state.config, query.limit);
    let messages = state
        .chat_service
        .history(&cid, Some(limit), query.offset)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;

    let resp = ApiResponse::success(messages, request_id, elapsed)
        .with_link("self", &format!("/api/v1/chats/{chat_id}/messages"))
        .with_link("chat", &format!("/api/v1/chats/{chat_id}"));

    Ok(Json(resp))
}

/// POST /api/v1/chats/{id}/messages - Durable send; returns the persisted message.
pub async fn send_message(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<ApiResponse<ChatMessage>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let cid = parse_uuid(&chat_id)?;
    let message = state
        .chat_service
        .send_message(cid, req.sender_id, &req.content)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;

    let resp = ApiResponse::success(message, request_id, elapsed)
        .with_link("self", &format!("/api/v1/chats/{chat_id}/messages"))
        .with_link("chat", &format!("/api/v1/chats/{chat_id}"));

    Ok(Json(resp))
}
