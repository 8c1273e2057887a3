//
// Copyright (c) 2025 TRUSTEDGE LABS LLC
// This source code is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Project: trustedge — Privacy and trust at the edge.
//

//! Meeting-artifact pipeline server — thin entry point for the Axum HTTP
//! service.
//!
//! All routing logic lives in `meetvault_platform::http::create_router`. This
//! binary is responsible only for: CLI parsing, env config loading, AppState
//! wiring, server binding, and graceful shutdown.

use anyhow::Result;
use clap::{Parser, Subcommand};
use meetvault_core::Vault;
use meetvault_platform::bot::BotAdapter;
use meetvault_platform::http::config::SummarizerConfig;
use meetvault_platform::http::{create_router, AppState, Config, IdentityVerifier};
use meetvault_platform::processors::{Summarizer, Transcriber};
use meetvault_platform::store::{create_connection_pool, run_migrations};
use meetvault_platform::{Pipeline, Store};

/// Meeting-artifact pipeline server — boots the HTTP service that joins
/// meetings, ingests recordings, and serves transcripts/summaries.
#[derive(Parser)]
#[command(
    name = "meetvault-server",
    version = env!("CARGO_PKG_VERSION"),
    about = "meeting-artifact pipeline server"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default)
    Serve,
    /// Run database migrations
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve().await,
        Commands::Migrate => migrate().await,
    }
}

async fn serve() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;

    tracing::info!(
        "meetvault-server v{} starting on port {}",
        env!("CARGO_PKG_VERSION"),
        config.port
    );

    let pool = create_connection_pool(&config.database_url).await?;
    run_migrations(&pool).await?;
    let store = Store::new(pool, config.server_master_key);

    let vault = Vault::new(config.vault_dir.clone());
    let bot = BotAdapter::new(config.bot_provider_base_url.clone(), config.bot_provider_api_key.clone());
    let transcriber = Transcriber::new(config.transcriber_bin.clone());
    let summarizer = match &config.summarizer {
        SummarizerConfig::Subprocess(bin) => Summarizer::subprocess(bin.clone()),
        SummarizerConfig::Http(url) => Summarizer::http(url.clone()),
    };

    let pipeline = Pipeline::new(store, vault, bot, transcriber, summarizer);
    let identity = IdentityVerifier::new(config.auth_mode.clone());
    let state = AppState { pipeline, identity };

    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    tracing::info!("listening on 0.0.0.0:{}", config.port);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server shut down cleanly");
    Ok(())
}

async fn migrate() -> Result<()> {
    tracing_subscriber::fmt::init();
    let config = Config::from_env()?;
    let pool = create_connection_pool(&config.database_url).await?;
    run_migrations(&pool).await?;
    tracing::info!("migrations complete");
    Ok(())
}

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

    tracing::info!("shutdown signal received, draining connections...");
}
