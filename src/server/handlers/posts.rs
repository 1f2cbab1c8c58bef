use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::prompt::GenerationRequest;
use crate::state::AppState;
use crate::writer::{reference_previews, PREVIEW_CHARS};

pub async fn generate_post(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<GenerationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state.writer.write(&payload).await?;
    let previews = reference_previews(&post.references_used, PREVIEW_CHARS);
    Ok(Json(json!({
        "body_text": post.body_text,
        "references_used": post.references_used,
        "reference_previews": previews,
    })))
}
