use std::sync::Arc;

use crate::backend::{Backend, RestBackend};
use crate::model::ModelManager;
use crate::utils::signal::shutdown_signal;
use crate::{error::AppResult, web::AppState};
use axum::Router;
use tokio::net::TcpListener;

pub mod config;
pub use config::{Config, ConfigError, ConfigResult};

pub mod backend;
pub mod error;
pub mod model;
pub mod player;
pub mod utils;
pub mod web;

static APPLICATION_NAME: &str = "mestre";

pub async fn build_server() -> AppResult<(AppState, Router)> {
    let use_local = cfg!(debug_assertions);
    let config = Config::load(use_local)?;

    let backend = Arc::new(RestBackend::from_config(&config));
    build_server_with_backend(backend, config).await
}

/// Assembles the app around any [`Backend`], the test suite passes a
/// [`backend::MemoryBackend`] here.
pub async fn build_server_with_backend(
    backend: Arc<dyn Backend>,
    config: Config,
) -> AppResult<(AppState, Router)> {
    let mm = ModelManager::new(backend);
    let state = AppState::new(mm, Arc::new(config));
    let app = web::routes::build_app(state.clone());
    Ok((state, app))
}

#[tracing::instrument]
pub async fn setup_workers() -> AppResult<()> {
    let (state, app) = build_server().await?;
    let bindto = state.config().host().bindto().to_string();
    let listener = TcpListener::bind(&bindto).await?;

    tracing::info!("axum is starting at: {}", bindto);
    let axum_handle = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

    axum_handle.await?;
    tracing::info!("server stopped");
    Ok(())
}

fn setup_trace() {
    use tracing_error::ErrorLayer;
    use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

    // load .env file for RUST_LOG etc.
    let _ = dotenvy::dotenv();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("mestre=info,tower_http=info"));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .with(ErrorLayer::default())
        .init();

    tracing::debug!("tracing initialized.");
}

#[tracing::instrument]
pub async fn run() -> AppResult<()> {
    setup_trace();
    setup_workers().await?;
    Ok(())
}
