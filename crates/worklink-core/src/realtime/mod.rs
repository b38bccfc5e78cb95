//! Realtime delivery: room registry, gateway, authorization, fan-out.
//!
//! Everything here is process-local and ephemeral. Durable state lives
//! behind the `ChatRepository` trait; this module only routes live
//! events to the connections that should see them.

pub mod access;
pub mod fanout;
pub mod gateway;
pub mod registry;
