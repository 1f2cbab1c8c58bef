use async_trait::async_trait;

use crate::core::errors::ApiError;
use super::types::{GenerateRequest, ProviderModel};

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// return the provider name (e.g. "gemini")
    fn name(&self) -> &str;

    /// every model the backend exposes to this key
    async fn list_models(&self) -> Result<Vec<ProviderModel>, ApiError>;

    /// single-shot text completion
    async fn generate(&self, request: GenerateRequest, model_id: &str) -> Result<String, ApiError>;

    /// generate embeddings, one vector per input and in input order
    async fn embed(&self, inputs: &[String], model_id: &str) -> Result<Vec<Vec<f32>>, ApiError>;
}
