//! Interactive terminal chat client for Worklink.
//!
//! This module implements the live conversation view: REST history merged
//! with WebSocket events through `ChatController`, optimistic sends, read
//! receipts, inbox notifications, and slash commands. Entry point:
//! `loop_runner::run_chat_loop`.

pub mod commands;
pub mod input;
pub mod loop_runner;
pub mod remote;
pub mod renderer;
