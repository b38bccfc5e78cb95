//! Observability layer for Worklink.
//!
//! Structured logging via `tracing`, with optional OpenTelemetry span export
//! for the gateway server.

pub mod tracing_setup;
