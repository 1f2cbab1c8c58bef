use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::core::errors::ApiError;
use super::provider::LlmProvider;
use super::types::{GenerateRequest, ProviderModel, GENERATE_METHOD};

const MODELS_PAGE_SIZE: u32 = 1000;

/// Google Generative Language REST API (`v1beta`).
#[derive(Clone)]
pub struct GeminiProvider {
    base_url: String,
    api_key: String,
    client: Client,
}

impl GeminiProvider {
    /// Fails with a configuration error when the key is blank, before any request is made.
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, ApiError> {
        if api_key.trim().is_empty() {
            return Err(ApiError::Configuration(
                "Gemini API key is not set".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::internal)?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.trim().to_string(),
            client,
        })
    }

    fn model_url(&self, model_id: &str, action: &str) -> String {
        format!(
            "{}/v1beta/models/{}:{}",
            self.base_url,
            model_path(model_id),
            action
        )
    }

    async fn post(&self, url: &str, body: &Value) -> Result<Value, ApiError> {
        self.send(self.client.post(url).json(body)).await
    }

    async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<Value, ApiError> {
        self.send(self.client.get(url).query(query)).await
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value, ApiError> {
        let res = request
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .map_err(ApiError::backend)?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::BackendFailure(format!(
                "Gemini request failed ({}): {}",
                status,
                error_message(&text)
            )));
        }

        res.json::<Value>().await.map_err(|e| {
            ApiError::BackendFailure(format!("Gemini returned malformed JSON: {}", e))
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelListResponse {
    #[serde(default)]
    models: Vec<ModelEntry>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelEntry {
    name: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

impl From<ModelEntry> for ProviderModel {
    fn from(entry: ModelEntry) -> Self {
        let id = model_path(&entry.name).to_string();
        ProviderModel {
            display_name: entry.display_name.unwrap_or_else(|| id.clone()),
            id,
            methods: entry.supported_generation_methods,
        }
    }
}

#[derive(Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    #[serde(default)]
    values: Vec<f32>,
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn list_models(&self) -> Result<Vec<ProviderModel>, ApiError> {
        let url = format!("{}/v1beta/models", self.base_url);
        let mut models = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("pageSize", MODELS_PAGE_SIZE.to_string())];
            if let Some(token) = &page_token {
                query.push(("pageToken", token.clone()));
            }
            let payload = self.get(&url, &query).await?;
            let page: ModelListResponse = serde_json::from_value(payload).map_err(|e| {
                ApiError::BackendFailure(format!("Gemini returned a malformed model list: {}", e))
            })?;
            models.extend(page.models.into_iter().map(ProviderModel::from));

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) if page_token.as_deref() != Some(next.as_str()) => page_token = Some(next),
                _ => break,
            }
        }

        tracing::debug!("Gemini lists {} models", models.len());
        Ok(models)
    }

    async fn generate(&self, request: GenerateRequest, model_id: &str) -> Result<String, ApiError> {
        let url = self.model_url(model_id, GENERATE_METHOD);

        let mut body = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": request.prompt }]
            }]
        });

        let mut generation_config = serde_json::Map::new();
        if let Some(t) = request.temperature { generation_config.insert("temperature".to_string(), json!(t)); }
        if let Some(t) = request.max_output_tokens { generation_config.insert("maxOutputTokens".to_string(), json!(t)); }
        if !generation_config.is_empty() {
            if let Some(obj) = body.as_object_mut() {
                obj.insert("generationConfig".to_string(), Value::Object(generation_config));
            }
        }

        let payload = self.post(&url, &body).await?;
        extract_text(&payload)
    }

    async fn embed(&self, inputs: &[String], model_id: &str) -> Result<Vec<Vec<f32>>, ApiError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let url = self.model_url(model_id, "batchEmbedContents");
        let model = format!("models/{}", model_path(model_id));
        let requests: Vec<Value> = inputs
            .iter()
            .map(|text| {
                json!({
                    "model": model,
                    "content": { "parts": [{ "text": text }] }
                })
            })
            .collect();

        let payload = self.post(&url, &json!({ "requests": requests })).await?;
        let response: BatchEmbedResponse = serde_json::from_value(payload).map_err(|e| {
            ApiError::BackendFailure(format!("Gemini returned malformed embeddings: {}", e))
        })?;

        if response.embeddings.len() != inputs.len() {
            return Err(ApiError::BackendFailure(format!(
                "Gemini returned {} embeddings for {} inputs",
                response.embeddings.len(),
                inputs.len()
            )));
        }

        Ok(response.embeddings.into_iter().map(|e| e.values).collect())
    }
}

/// Accepts both `gemini-pro` and `models/gemini-pro`.
fn model_path(model_id: &str) -> &str {
    model_id.strip_prefix("models/").unwrap_or(model_id)
}

fn extract_text(payload: &Value) -> Result<String, ApiError> {
    if let Some(reason) = payload["promptFeedback"]["blockReason"].as_str() {
        return Err(ApiError::BackendFailure(format!(
            "Gemini blocked the prompt: {}",
            reason
        )));
    }

    let parts = payload["candidates"][0]["content"]["parts"]
        .as_array()
        .ok_or_else(|| {
            ApiError::BackendFailure("Gemini response has no candidates".to_string())
        })?;

    let text: String = parts
        .iter()
        .filter_map(|part| part["text"].as_str())
        .collect();

    if text.trim().is_empty() {
        return Err(ApiError::BackendFailure(
            "Gemini response contains no text".to_string(),
        ));
    }

    Ok(text)
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}
