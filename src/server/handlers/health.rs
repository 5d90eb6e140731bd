use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::state::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let llm_reachable = state.llm.health_check().await.unwrap_or(false);
    let corpus_size = state.retrieval.corpus_size().await.unwrap_or(0);

    Ok(Json(json!({
        "status": "ok",
        "provider": state.llm.name(),
        "llm_reachable": llm_reachable,
        "corpus_size": corpus_size,
        "zones": state.registry.len(),
        "started_at": state.started_at.to_rfc3339(),
    })))
}
