mod agents;
mod core;
mod data;
mod llm;
mod rag;
mod server;
mod state;

use std::env;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let state = AppState::initialize()?;
    core::logging::init(&state.paths);

    // One-time blocking corpus build before the first query is served. A
    // failure here (e.g. embedding service down) is retried lazily on the
    // first query instead of aborting startup.
    match state.retrieval.ensure_built().await {
        Ok(()) => {
            let size = state.retrieval.corpus_size().await.unwrap_or(0);
            tracing::info!(records = size, "Retrieval index ready");
        }
        Err(err) => tracing::warn!("Deferred index build: {}", err),
    }

    let port = env::var("PORT")
        .ok()
        .and_then(|val| val.parse::<u16>().ok())
        .unwrap_or(state.settings.server.port);
    let bind_addr = format!("{}:{}", state.settings.server.host, port);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;

    tracing::info!("Listening on {}", addr);

    let app: Router = server::router::router(state.clone());
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
