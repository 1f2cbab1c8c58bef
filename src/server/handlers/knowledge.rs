use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub text: String,
    #[serde(default)]
    pub k: Option<usize>,
}

pub async fn rebuild_index(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let summary = state.knowledge.rebuild().await?;
    Ok(Json(json!({
        "documents": summary.documents,
        "skipped": summary.skipped,
    })))
}

pub async fn query(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<QueryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let answer = state.knowledge.query(&payload.text, payload.k).await?;
    Ok(Json(answer))
}
