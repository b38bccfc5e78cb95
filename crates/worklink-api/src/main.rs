//! Worklink CLI and gateway entry point.
//!
//! Binary name: `wlink`
//!
//! Parses CLI arguments, initializes tracing, then either starts the REST +
//! WebSocket gateway server or opens the interactive terminal chat client.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,worklink_core=debug,worklink_api=debug,worklink_infra=debug",
        _ => "trace",
    };

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "wlink", &mut std::io::stdout());
        return Ok(());
    }

    match cli.command {
        Commands::Serve { port, host, otel } => {
            // The server runs the full observe stack; span export is opt-in.
            worklink_observe::tracing_setup::init_tracing(filter, otel)
                .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

            let state = AppState::init().await?;

            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            println!(
                "  {} Worklink gateway listening on {}",
                console::style("⚡").bold(),
                console::style(format!("http://{addr}")).cyan()
            );
            println!("  {}", console::style("Press Ctrl+C to stop").dim());

            let router = http::router::build_router(state);

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            worklink_observe::tracing_setup::shutdown_tracing();
            println!("\n  Server stopped.");
        }

        Commands::Chat { user, server, chat } => {
            tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::new(filter))
                .with_target(false)
                .init();

            cli::chat::loop_runner::run_chat_loop(user, &server, chat).await?;
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
