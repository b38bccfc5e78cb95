//! Infrastructure layer for Worklink.
//!
//! Contains implementations of the repository traits defined in
//! `worklink-core`: SQLite chat storage with split read/write pools, and the
//! global configuration loader.

pub mod config;
pub mod sqlite;
