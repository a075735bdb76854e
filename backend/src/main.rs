//! Main entry point for the headless API backend.
//!
//! Parses the command line, loads configuration, and either manages the
//! database or wires the bearer authentication stack into the Axum server.

mod api;
mod auth;
mod cli;
mod config;
mod database;
mod errors;
mod repositories;
mod services;
mod state;
mod utils;

use crate::auth::csrf::DoubleSubmitCsrf;
use crate::auth::middleware::{BearerAuthenticator, TokenTransport};
use crate::auth::service::AuthService;
use crate::auth::store::{SqliteTokenStore, TokenStore};
use crate::database::models::CreateNewUser;
use crate::services::{token_purge, user_service::UserService};
use crate::state::AppState;
use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands};
use config::Config;
use database::Database;
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("headless=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let db = Database::new(&config).await?;
    db.migrate().await?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config, &db).await?,
        Commands::Migrate => info!("Migrations are up to date"),
        Commands::CreateUser {
            username,
            password,
            email,
        } => {
            let users = UserService::new(db.pool().clone(), config.store_timeout());
            let user = users
                .create_user(CreateNewUser {
                    username,
                    password,
                    email,
                })
                .await
                .context("Failed to create user")?;
            println!("{}", user.id);
        }
    }

    db.close().await;
    Ok(())
}

async fn serve(config: Config, db: &Database) -> anyhow::Result<()> {
    let pool = db.pool().clone();
    let config = Arc::new(config);

    let users = Arc::new(UserService::new(pool.clone(), config.store_timeout()));
    let tokens: Arc<dyn TokenStore> =
        Arc::new(SqliteTokenStore::new(pool, config.store_timeout()));
    let csrf = Arc::new(DoubleSubmitCsrf::new(
        config.session_cookie.clone(),
        config.csrf_cookie.clone(),
    ));

    let authenticator = BearerAuthenticator::new(
        config.api_prefix(),
        config.bearer_tokens_enabled,
        TokenTransport {
            query_key: config.bearer_query_key.clone(),
        },
        tokens.clone(),
        users.clone(),
        csrf,
    );
    let auth_service = AuthService::new(users, tokens.clone(), config.token_lifetime());

    let purge = token_purge::spawn(tokens, config.token_purge_interval());

    let app = api::app(AppState {
        config: config.clone(),
        auth_service: Arc::new(auth_service),
        authenticator: Arc::new(authenticator),
    });

    let bind_address = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;

    info!(
        "Starting headless server on port {} (prefix {}, bearer tokens {})",
        config.server_port,
        config.api_prefix(),
        if config.bearer_tokens_enabled { "enabled" } else { "disabled" }
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    purge.abort();
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
