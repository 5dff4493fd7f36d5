//! vidseq-api - HTTP API server for vidseq.

mod handlers;
mod state;

use std::net::SocketAddr;

use axum::{
    http::Method,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use vidseq_core::defaults;

use handlers::{extract, health, search, upload, ws_progress};
use state::AppState;

fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(defaults::CORS_MAX_AGE_SECS));

    Router::new()
        .route("/api/health", get(health))
        .route("/api/upload", post(upload))
        .route("/api/search", post(search))
        .route("/api/extract", get(extract))
        .route("/ws/:task_id", get(ws_progress))
        .layer(RequestBodyLimitLayer::new(defaults::MAX_UPLOAD_SIZE_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let state = AppState::from_env().await?;
    let app = router(state);

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(defaults::SERVER_PORT);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!(%addr, "vidseq API listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
