use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::agents::AnswerOutcome;
use crate::core::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
    pub zone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IdentifyRequest {
    pub question: String,
}

#[derive(Debug, Deserialize)]
pub struct ContextRequest {
    pub question: String,
    pub zone: Option<String>,
}

fn require_question(question: &str) -> Result<(), ApiError> {
    if question.trim().is_empty() {
        return Err(ApiError::BadRequest("question must not be empty".to_string()));
    }
    Ok(())
}

pub async fn ask(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_question(&payload.question)?;

    let outcome = state
        .router
        .route(&payload.question, payload.zone.as_deref())
        .await;

    let status = match &outcome {
        AnswerOutcome::Answered(_) => "answered",
        AnswerOutcome::ServiceUnavailable(_) => "service_unavailable",
    };

    Ok(Json(json!({
        "answer": outcome.text(),
        "status": status,
    })))
}

pub async fn identify_zone(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<IdentifyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_question(&payload.question)?;

    let zone = state.router.identify_zone(&payload.question).await;
    Ok(Json(json!({ "zone": zone })))
}

pub async fn context(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ContextRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_question(&payload.question)?;

    let outcome = state
        .retrieval
        .context_for_query(&payload.question, payload.zone.as_deref())
        .await?;

    Ok(Json(json!({
        "context": outcome.as_text(),
        "found": outcome.is_found(),
    })))
}

pub async fn list_zones(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let zones: Vec<Value> = state
        .registry
        .iter()
        .map(|responder| {
            json!({
                "name": responder.zone(),
                "description": responder.description(),
            })
        })
        .collect();

    Ok(Json(json!({ "zones": zones })))
}
