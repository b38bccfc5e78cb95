//! HTTP/WebSocket layer for Worklink.
//!
//! Axum-based REST API at `/api/v1/` with envelope response format, CORS
//! support, and the realtime WebSocket gateway at `/ws`.

pub mod error;
pub mod handlers;
pub mod response;
pub mod router;
