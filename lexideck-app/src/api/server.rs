use axum::{
    routing::{get, post},
    Router,
};
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tokio::net::TcpListener;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::info;

use crate::api::routes::{health, list_cards, webhook, AppState};

pub fn router(state: Arc<AppState>, audio_dir: Option<PathBuf>) -> Router {
    let mut app = Router::new()
        .route("/health", get(health))
        .route("/webhook", post(webhook))
        .route("/cards", get(list_cards));
    if let Some(dir) = audio_dir {
        app = app.nest_service("/audio", ServeDir::new(dir));
    }
    app.with_state(state).layer(TraceLayer::new_for_http())
}

pub async fn run(state: Arc<AppState>, audio_dir: Option<PathBuf>, addr: SocketAddr) -> anyhow::Result<()> {
    let app = router(state, audio_dir);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "webhook server listening");
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("webhook server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available; run until killed.
        std::future::pending::<()>().await;
    }
}
