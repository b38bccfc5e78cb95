//! Business logic and repository trait definitions for Worklink.
//!
//! This crate defines the "ports" (repository traits) that the
//! infrastructure layer implements, plus the realtime gateway, room
//! registry, and notification fan-out built on top of them. It depends
//! only on `worklink-types` -- never on `worklink-infra` or any
//! database/IO crate.

pub mod chat;
pub mod realtime;
