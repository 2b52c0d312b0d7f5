use dotenvy::dotenv;
use log::{error, info};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use guardian_server::api_router::configure_api_routes;
use guardian_server::config::AppConfig;
use guardian_server::shared::state::AppState;
use guardian_server::shared::utils::{create_conn, run_embedded_migrations};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .write_style(env_logger::WriteStyle::Always)
        .init();

    let config = AppConfig::from_env().map_err(|e| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("Failed to load config: {e}"),
        )
    })?;

    let pool = match create_conn() {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to create database pool: {e}");
            return Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                format!("Database pool creation failed: {e}"),
            ));
        }
    };

    if let Err(e) = run_embedded_migrations(&pool) {
        error!("Failed to run migrations: {e}");
        return Err(std::io::Error::other(format!("Migration failure: {e}")));
    }

    let app_state = Arc::new(AppState {
        config: config.clone(),
        conn: pool,
    });

    let app = configure_api_routes()
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Starting HTTP server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        error!("Failed to install shutdown signal handler");
    }
    info!("Shutdown signal received");
}
