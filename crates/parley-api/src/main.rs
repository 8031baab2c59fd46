//! Parley CLI and REST API entry point.
//!
//! Binary name: `parley`
//!
//! Parses CLI arguments, opens the store and loads configuration, then
//! dispatches to the appropriate command handler or starts the REST API
//! server.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;

use parley_core::summary::worker::SummaryWorker;
use parley_types::inbound::{InboundMessage, Sender};

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,parley=debug",
        _ => "trace",
    };
    parley_observe::tracing_setup::init_tracing(cli.otel, filter)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "parley", &mut std::io::stdout());
        return Ok(());
    }

    let result = run(cli).await;
    parley_observe::tracing_setup::shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let state = AppState::init().await?;

    match cli.command {
        Commands::Say {
            user,
            nickname,
            group,
            text,
        } => {
            let message = match group {
                Some(group_id) => InboundMessage::group(group_id, user, nickname, text),
                None => InboundMessage::private(user, nickname, text),
            };
            let (dispatcher, worker) = state.assistant()?;
            let result = cli::say::say(&dispatcher, message, cli.json, cli.quiet).await;
            finish(worker).await;
            result?;
        }

        Commands::Cmd { user, name, arg } => {
            let (dispatcher, worker) = state.assistant()?;
            let result =
                cli::say::run_command(&dispatcher, &user, &name, arg.as_deref(), cli.json).await;
            finish(worker).await;
            result?;
        }

        Commands::Chat { user, nickname } => {
            let (dispatcher, worker) = state.assistant()?;
            let sender = Sender {
                user_id: user,
                nickname,
            };
            let result = cli::chat::loop_runner::run_chat_loop(&dispatcher, sender).await;
            finish(worker).await;
            result?;
        }

        Commands::Kv { action } => {
            cli::kv::handle_kv_command(action, state.kv_store.as_ref(), cli.json).await?;
        }

        Commands::Status => {
            cli::status::status(&state, cli.json).await?;
        }

        Commands::Serve { port, host } => {
            let (dispatcher, worker) = state.assistant()?;

            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            println!(
                "  {} Parley API listening on {}",
                console::style("⚡").bold(),
                console::style(format!("http://{addr}")).cyan()
            );
            println!("  {}", console::style("Press Ctrl+C to stop").dim());

            let router = http::router::build_router(dispatcher);

            let served = axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await;
            finish(worker).await;
            served?;

            println!("\n  Server stopped.");
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}

/// Let pending summary refreshes land before exit.
async fn finish(worker: SummaryWorker) {
    worker.shutdown().await;
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
