use thiserror::Error;

use crate::core::errors::ApiError;

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("Failed to load configuration: {0}")]
    Config(#[source] ApiError),

    #[error("Failed to initialize spreadsheet source: {0}")]
    Source(#[source] ApiError),

    #[error("Failed to initialize generation backend: {0}")]
    Llm(#[source] ApiError),
}
