use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let knowledge = state.knowledge.current().await;
    Json(json!({
        "status": "ok",
        "knowledge_documents": knowledge.as_ref().map(|index| index.len()).unwrap_or(0),
        "knowledge_built_at": knowledge.as_ref().map(|index| index.built_at()),
        "chat_listener": state.chat.is_running().await,
    }))
}
