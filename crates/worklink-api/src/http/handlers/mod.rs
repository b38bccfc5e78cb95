//! HTTP request handlers for the REST API and the WebSocket gateway.

pub mod chat;
pub mod ws;
