//! CuraBot server binary.
//!
//! Startup order: logging → config → database (create + migrate) →
//! optional admin seeding → LLM client → HTTP server. Migration
//! failure is fatal; a missing Ollama daemon is not (chat endpoints
//! surface it as 502 at request time).

use std::process::ExitCode;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use curabot::api::{self, types::ApiContext};
use curabot::auth;
use curabot::config::{self, AppConfig};
use curabot::db;
use curabot::llm::ollama::OllamaClient;
use curabot::models::enums::Role;

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!(version = config::APP_VERSION, "{} starting", config::APP_NAME);

    let config = AppConfig::from_env();

    if let Some(parent) = config.db_path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            tracing::error!("Cannot create data directory {}: {e}", parent.display());
            return ExitCode::FAILURE;
        }
    }

    // Open once at startup to create the file and run migrations;
    // request handlers open their own short-lived connections.
    let conn = match db::open_database(&config.db_path) {
        Ok(conn) => conn,
        Err(e) => {
            tracing::error!("Database initialization failed: {e}");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(path = %config.db_path.display(), "Database ready");

    // CURABOT_SEED_ADMIN=email:password creates the admin account on
    // first boot; subsequent boots log and skip.
    if let Ok(seed) = std::env::var("CURABOT_SEED_ADMIN") {
        if let Err(e) = seed_admin(&conn, &seed) {
            tracing::error!("Admin seeding failed: {e}");
            return ExitCode::FAILURE;
        }
    }
    drop(conn);

    let llm = match OllamaClient::new(
        &config.ollama_url,
        &config.ollama_model,
        config.ollama_timeout_secs,
    ) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            tracing::error!("Cannot build Ollama client: {e}");
            return ExitCode::FAILURE;
        }
    };

    let ctx = ApiContext::new(&config, llm);
    let mut server = match api::start(ctx, config.bind_addr).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Cannot bind {}: {e}", config.bind_addr);
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(addr = %server.addr, "Listening");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Signal handler failed: {e}");
    }
    tracing::info!("Shutting down");
    server.shutdown();
    server.wait().await;

    ExitCode::SUCCESS
}

fn seed_admin(conn: &rusqlite::Connection, seed: &str) -> Result<(), String> {
    let (email, password) = seed
        .split_once(':')
        .ok_or("CURABOT_SEED_ADMIN must be email:password")?;

    match auth::register(conn, "Administrator", email, password, Role::Admin) {
        Ok(user) => {
            tracing::info!(email = %user.email, "Admin account created");
            Ok(())
        }
        Err(auth::AuthError::EmailTaken) => {
            tracing::info!("Admin account already exists, skipping seed");
            Ok(())
        }
        Err(e) => Err(e.to_string()),
    }
}
