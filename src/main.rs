//! Main entry point for the application.
//!
//! Loads the configuration, registers the training tasks, starts the broker
//! worker pool and serves the HTTP API that queues training chains.

mod api;
mod auth;
mod cli;
mod config;
mod constants;
mod core;
mod db;
mod errors;
mod models;
mod schema;
mod tasks;
mod utils;

use clap::Parser;
use config::{AppConfig, ResultBackendConfig, SECRET_KEY_ENV};
use crate::core::{Broker, InMemoryBackend, ResultBackend};
use db::SqliteBackend;
use std::error::Error;
use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    if let Some(password) = &cli.hash_password {
        println!("{}", auth::hash_password(password));
        return;
    }

    utils::init_logging(&cli.logging_level, cli.log_to_file);

    if let Err(e) = dotenvy::dotenv() {
        warn!("Failed to load .env file: {}", e);
    }

    if let Err(e) = run(cli).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

/// # Startup steps:
/// 1. Load configuration and apply environment and CLI overrides
/// 2. Open the result backend
/// 3. Register tasks and freeze the registry
/// 4. Start the broker worker pool
/// 5. Serve the API
async fn run(cli: cli::Cli) -> Result<(), Box<dyn Error>> {
    let mut config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => {
            info!("No configuration file given, using defaults");
            AppConfig::default()
        }
    };
    config.apply_env();
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(workers) = cli.workers {
        config.broker.workers = workers;
    }

    if config.auth.secret_key.is_empty() {
        return Err(format!(
            "auth.secret_key is not set, configure it or export {}",
            SECRET_KEY_ENV
        )
        .into());
    }
    if config.auth.users.is_empty() {
        warn!("No users configured, every login will be rejected");
    }

    let backend: Arc<dyn ResultBackend> = match &config.broker.result_backend {
        ResultBackendConfig::Memory => Arc::new(InMemoryBackend::new()),
        ResultBackendConfig::Sqlite { path } => {
            info!("Storing results in {}", path);
            Arc::new(SqliteBackend::open(path)?)
        }
    };

    let registry = Arc::new(tasks::default_registry(&config.training)?);
    let broker = Broker::start(backend, &config.broker);

    let credentials = auth::CredentialsProvider::new(&config.auth.users);
    let tokens = auth::TokenProvider::new(
        &config.auth.secret_key,
        config.auth.access_token_expires,
        credentials,
    );

    api::server::launch_server(
        &config.server,
        api::AppState {
            registry,
            broker,
            tokens,
        },
    )
    .await
}
