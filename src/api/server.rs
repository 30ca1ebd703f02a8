use crate::api::routes;
use crate::api::state::AppState;
use crate::config::ServerConfig;
use tracing::{error, info};

/// Serves the API until Ctrl-C is received
///
/// # Arguments
/// * `config` - Interface and port to listen on
/// * `state` - Shared state handed to every handler
pub async fn launch_server(
    config: &ServerConfig,
    state: AppState,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = routes::app(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
