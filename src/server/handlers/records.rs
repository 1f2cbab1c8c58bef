use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::state::AppState;

pub async fn list_authors(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let table = state.records.snapshot().await;
    Ok(Json(json!({ "authors": table.authors() })))
}

pub async fn refresh_records(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let table = state.records.refresh().await;
    tracing::info!("Record table refreshed on request ({} records)", table.len());
    Ok(Json(json!({
        "records": table.len(),
        "authors": table.authors(),
    })))
}
