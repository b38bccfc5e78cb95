//! Chat persistence abstractions and chat-side state machines.
//!
//! This module defines the `ChatRepository` trait that the infrastructure
//! layer implements, the `ChatService` that owns the durable send
//! pipeline, and the client-side `ChatController` that merges fetched
//! history with live events.

pub mod controller;
pub mod repository;
pub mod service;

#[cfg(test)]
pub(crate) mod testing;
