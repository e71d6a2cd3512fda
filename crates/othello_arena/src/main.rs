//! Othello Arena - unified CLI
//!
//! Runs the match server or an automated player.

#![warn(missing_docs)]

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command, StrategyKind};
use othello_arena::{BotConfig, MatchServer, ServerConfig, run_bot, serve};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            config,
            host,
            port,
            name,
            idle_timeout,
        } => {
            let mut settings = match config {
                Some(path) => ServerConfig::from_file(path)?,
                None => ServerConfig::default(),
            };
            if let Some(host) = host {
                settings = settings.with_host(host);
            }
            if let Some(port) = port {
                settings = settings.with_port(port);
            }
            if let Some(name) = name {
                settings = settings.with_server_name(name);
            }
            if idle_timeout.is_some() {
                settings = settings.with_idle_timeout_secs(idle_timeout);
            }
            run_server(settings).await
        }
        Command::Bot {
            server,
            name,
            strategy,
            games,
        } => run_bot_command(BotConfig { server, name, games }, strategy).await,
    }
}

/// Run the match server until Ctrl-C
#[instrument(skip_all, fields(host = %config.host(), port = config.port()))]
async fn run_server(config: ServerConfig) -> Result<()> {
    let listener = TcpListener::bind(config.socket_addr()?).await?;
    info!(addr = %listener.local_addr()?, "Othello Arena listening");

    let server = MatchServer::new(config.server_name());
    let shutdown = CancellationToken::new();

    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Ctrl-C received, shutting down"),
            Err(e) => error!(error = %e, "Failed to listen for Ctrl-C, shutting down"),
        }
        ctrl_c.cancel();
    });

    serve(listener, server, config.idle_timeout(), shutdown).await?;
    info!("Server stopped");
    Ok(())
}

/// Run an automated player
async fn run_bot_command(config: BotConfig, strategy: StrategyKind) -> Result<()> {
    let strategy = strategy.build();
    let summary = run_bot(&config, strategy.as_ref()).await?;
    println!(
        "{} played {} game(s): {} won, {} lost, {} drawn",
        config.name,
        summary.played(),
        summary.won,
        summary.lost,
        summary.drawn
    );
    Ok(())
}
