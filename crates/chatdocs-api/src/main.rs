//! chatdocs CLI and REST API entry point.
//!
//! Binary name: `chatdocs`
//!
//! Parses CLI arguments, loads configuration, wires services, then runs a
//! management command or starts the REST API server.

mod cli;
mod http;
mod state;

use anyhow::Context;
use clap::Parser;

use chatdocs_infra::config::{data_dir, load_gateway_config, validate};
use chatdocs_observe::tracing_setup::{LogOptions, filter_for_verbosity, init_tracing, shutdown_tracing};
use chatdocs_types::user::RegisterUserRequest;

use cli::{ChatbotCommand, Cli, Commands, UserCommand};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(&LogOptions {
        default_filter: filter_for_verbosity(cli.verbose).to_string(),
        json: cli.log_json,
        otel: cli.otel,
    })
    .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let data_dir = data_dir();
    let mut config = load_gateway_config(&data_dir)
        .await
        .context("invalid environment configuration")?;
    if let Commands::Serve { port, host } = &cli.command {
        if let Some(port) = port {
            config.server.port = *port;
        }
        if let Some(host) = host {
            config.server.host = host.clone();
        }
    }
    validate(&config).context("invalid configuration")?;

    let state = AppState::init(config, &data_dir).await?;

    match cli.command {
        Commands::Serve { .. } => serve(state).await?,

        Commands::User { action } => match action {
            UserCommand::Add {
                username,
                email,
                password,
                role,
            } => {
                let request = RegisterUserRequest {
                    username,
                    email,
                    password,
                    role,
                };
                cli::user::add_user(&state, request, cli.json).await?;
            }
            UserCommand::List => cli::user::list_users(&state, cli.json).await?,
            UserCommand::Delete { id } => cli::user::delete_user(&state, id, cli.json).await?,
        },

        Commands::Chatbot { action } => match action {
            ChatbotCommand::List { owner } => {
                cli::chatbot::list_chatbots(&state, owner, cli.json).await?;
            }
            ChatbotCommand::Delete { id, owner } => {
                cli::chatbot::delete_chatbot(&state, id, owner, cli.json).await?;
            }
            ChatbotCommand::Objects { id, owner } => {
                cli::chatbot::list_objects(&state, id, owner, cli.json).await?;
            }
        },
    }

    Ok(())
}

async fn serve(state: AppState) -> anyhow::Result<()> {
    state.bootstrap_admin().await?;

    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    println!(
        "  {} chatdocs API listening on {}",
        console::style("⚡").bold(),
        console::style(format!("http://{addr}")).cyan()
    );
    println!("  {}", console::style("Press Ctrl+C to stop").dim());
    tracing::info!(%addr, "Server started");

    let router = http::router::build_router(state);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    println!("\n  Server stopped.");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
