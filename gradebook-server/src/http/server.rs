//! Axum server setup.
//!
//! Server skeleton with:
//! - Localhost-only CORS by default
//! - Tracing middleware
//! - Graceful shutdown on SIGTERM/Ctrl+C
//!
//! All repositories are constructed here, once, before the listener
//! binds, so a bad schema mapping stops the process instead of surfacing
//! per request.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use gradebook_core::{Config, ConfigError, WarehouseSection};

use super::routes;
use crate::db::repos::{AttemptRepo, CourseRepo, QuestionRepo};
use crate::db::{create_pool, WarehouseClient};
use crate::ingest::Loader;

/// Shared application state: validated repositories plus the loader.
/// Everything here is read-only after construction.
pub struct AppState {
    pub attempts: AttemptRepo,
    pub questions: QuestionRepo,
    pub courses: CourseRepo,
    pub loader: Loader,
    pub warehouse: WarehouseSection,
}

impl AppState {
    pub fn new(pool: sqlx::PgPool, config: &Config) -> Result<Self, ConfigError> {
        let client = Arc::new(WarehouseClient::new(pool.clone()));
        Ok(Self {
            attempts: AttemptRepo::new(client.clone(), &config.warehouse, &config.exams)?,
            questions: QuestionRepo::new(client.clone(), &config.warehouse, &config.exams)?,
            courses: CourseRepo::new(client, &config.warehouse, &config.courses)?,
            loader: Loader::new(pool, &config.warehouse)?,
            warehouse: config.warehouse.clone(),
        })
    }
}

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to connect to warehouse: {0}")]
    Connect(#[from] sqlx::Error),

    #[error("invalid listen address: {0}")]
    Addr(#[from] std::net::AddrParseError),
}

/// Build the application router with all routes.
pub fn build_router(state: Arc<AppState>, cors_permissive: bool) -> Router {
    let cors = if cors_permissive {
        tracing::warn!("CORS: Permissive mode enabled - all origins allowed");
        CorsLayer::permissive()
    } else {
        // Localhost only
        CorsLayer::new()
            .allow_origin([
                "http://localhost:3000".parse().unwrap(),
                "http://localhost:8080".parse().unwrap(),
                "http://127.0.0.1:3000".parse().unwrap(),
                "http://127.0.0.1:8080".parse().unwrap(),
            ])
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Router::new()
        .merge(routes::health::router())
        .merge(routes::attempts::router())
        .merge(routes::questions::router())
        .merge(routes::courses::router())
        .merge(routes::files::router())
        .merge(routes::upload::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP server until shutdown.
pub async fn run_server(config: Config) -> Result<(), ServerError> {
    let database_url = config.warehouse.database_url()?.to_owned();
    let pool = create_pool(&database_url, config.warehouse.max_connections).await?;
    let state = Arc::new(AppState::new(pool, &config)?);

    let app = build_router(state, config.server.cors_permissive);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
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
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting shutdown");
        }
    }
}
