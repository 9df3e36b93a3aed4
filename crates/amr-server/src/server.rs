//! Router assembly for the dashboard HTTP+WS server.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::handlers::{runs, websocket};
use crate::session::SessionManager;

pub fn build_router() -> Router {
    let sessions = SessionManager::new();

    Router::new()
        .route("/api/runs", post(runs::create_run))
        .route("/ws/:run_id", get(websocket::ws_handler))
        .layer(CorsLayer::permissive())
        .with_state(sessions)
}

pub async fn serve(addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let router = build_router();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "amr-server listening");
    axum::serve(listener, router).await?;
    Ok(())
}
