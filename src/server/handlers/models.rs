use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::state::AppState;

/// Generation-capable models visible to the configured key.
pub async fn list_models(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let client = state.writer.client();
    let models = client.generation_models().await?;
    let configured_available = models.iter().any(|m| m.id == client.model());
    if !configured_available {
        tracing::warn!("Configured model '{}' is not listed for this key", client.model());
    }
    Ok(Json(json!({
        "configured": client.model(),
        "configured_available": configured_available,
        "models": models,
    })))
}
