//! CLI command definitions and dispatch for the `wlink` binary.
//!
//! Uses clap derive macros for argument parsing. `wlink serve` runs the
//! gateway server; `wlink chat` opens the interactive terminal client.

pub mod chat;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Realtime chat and notifications for the Worklink marketplace.
#[derive(Parser)]
#[command(name = "wlink", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the gateway server (REST API + WebSocket).
    Serve {
        /// Port to listen on.
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Export spans via OpenTelemetry (stdout exporter).
        #[arg(long)]
        otel: bool,
    },

    /// Open the interactive terminal chat client.
    Chat {
        /// User id to chat as.
        #[arg(long)]
        user: uuid::Uuid,

        /// Gateway server base URL.
        #[arg(long, default_value = "http://127.0.0.1:3000")]
        server: String,

        /// Chat id to open immediately.
        #[arg(long)]
        chat: Option<uuid::Uuid>,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
