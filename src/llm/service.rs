use std::sync::Arc;

use crate::core::errors::ApiError;
use super::provider::LlmProvider;
use super::types::{GenerateRequest, ProviderModel};

/// Sends one instruction to one configured model.
///
/// No retries and no partial results: the first failure is returned to the
/// caller as `ApiError::BackendFailure`.
#[derive(Clone)]
pub struct GenerationClient {
    provider: Arc<dyn LlmProvider>,
    model: String,
    temperature: Option<f64>,
}

impl GenerationClient {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: Option<f64>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Models this key may call for text generation, sorted by id.
    pub async fn generation_models(&self) -> Result<Vec<ProviderModel>, ApiError> {
        let mut models: Vec<ProviderModel> = self
            .provider
            .list_models()
            .await
            .map_err(|err| {
                tracing::warn!("Listing models via {} failed: {}", self.provider.name(), err);
                into_backend_failure(err)
            })?
            .into_iter()
            .filter(ProviderModel::supports_generation)
            .collect();
        models.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(models)
    }

    pub async fn generate(&self, instruction: &str) -> Result<String, ApiError> {
        let request = GenerateRequest::new(instruction).with_temperature(self.temperature);
        tracing::debug!(
            "Generating with {}:{} ({} chars)",
            self.provider.name(),
            self.model,
            instruction.chars().count()
        );

        self.provider
            .generate(request, &self.model)
            .await
            .map_err(|err| {
                tracing::warn!("Generation via {} failed: {}", self.provider.name(), err);
                into_backend_failure(err)
            })
    }
}

/// Embeds documents and queries with one fixed model, so build-time and
/// query-time vectors are comparable.
#[derive(Clone)]
pub struct Embedder {
    provider: Arc<dyn LlmProvider>,
    model: String,
    batch_size: usize,
}

impl Embedder {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>, batch_size: usize) -> Self {
        Self {
            provider,
            model: model.into(),
            batch_size: batch_size.max(1),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            let embedded = self
                .provider
                .embed(batch, &self.model)
                .await
                .map_err(into_backend_failure)?;
            if embedded.len() != batch.len() {
                return Err(ApiError::BackendFailure(format!(
                    "Expected {} embeddings, got {}",
                    batch.len(),
                    embedded.len()
                )));
            }
            vectors.extend(embedded);
        }
        Ok(vectors)
    }

    pub async fn embed_query(&self, text: &str) -> Result<Vec<f32>, ApiError> {
        let mut vectors = self
            .provider
            .embed(&[text.to_string()], &self.model)
            .await
            .map_err(into_backend_failure)?;
        vectors
            .pop()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::BackendFailure("Empty query embedding".to_string()))
    }
}

fn into_backend_failure(err: ApiError) -> ApiError {
    match err {
        ApiError::BackendFailure(_) | ApiError::Configuration(_) => err,
        other => ApiError::BackendFailure(other.to_string()),
    }
}
