use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use schedule_server::config::ServerConfig;
use schedule_server::store::Database;
use schedule_server::web::{AppState, create_router};

const DEFAULT_LOG_FILTER: &str = "schedule_server=info,tower_http=info";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    let db = match Database::connect(&config.database_url, config.max_connections).await {
        Ok(db) => db,
        Err(e) => {
            error!("failed to open schedule database: {e}");
            std::process::exit(1);
        }
    };

    let app = create_router(AppState::new(db.clone()), config.cors_origin.clone());

    let listener = match tokio::net::TcpListener::bind(config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(addr = %config.bind_addr, "failed to bind: {e}");
            std::process::exit(1);
        }
    };
    info!(addr = %config.bind_addr, "schedule server listening");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("server error: {e}");
    }

    db.close().await;
    info!("schedule server stopped");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        // Keep serving; the process can still be killed
        error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
