//! Shared domain types for Worklink.
//!
//! This crate contains the core domain types used across the Worklink
//! realtime chat platform: chats, messages, service statuses, wire events,
//! and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod realtime;
pub mod service;
