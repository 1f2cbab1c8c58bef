//! Scripted provider used by unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::errors::ApiError;
use super::provider::LlmProvider;
use super::types::{GenerateRequest, ProviderModel};

pub struct ScriptedProvider {
    reply: Result<String, ApiError>,
    embed_failure: Option<ApiError>,
    fixed_vectors: HashMap<String, Vec<f32>>,
    models: Vec<ProviderModel>,
    generate_calls: AtomicUsize,
    embed_calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
    last_model: Mutex<Option<String>>,
}

impl ScriptedProvider {
    pub fn replying(text: &str) -> Self {
        Self::with_reply(Ok(text.to_string()))
    }

    pub fn failing(err: ApiError) -> Self {
        Self::with_reply(Err(err))
    }

    fn with_reply(reply: Result<String, ApiError>) -> Self {
        Self {
            reply,
            embed_failure: None,
            fixed_vectors: HashMap::new(),
            models: Vec::new(),
            generate_calls: AtomicUsize::new(0),
            embed_calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
            last_model: Mutex::new(None),
        }
    }

    pub fn with_vector(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.fixed_vectors.insert(text.to_string(), vector);
        self
    }

    pub fn with_model(mut self, id: &str, methods: &[&str]) -> Self {
        self.models.push(ProviderModel {
            id: id.to_string(),
            display_name: id.to_string(),
            methods: methods.iter().map(|m| m.to_string()).collect(),
        });
        self
    }

    pub fn failing_embeddings(mut self, err: ApiError) -> Self {
        self.embed_failure = Some(err);
        self
    }

    pub fn generate_calls(&self) -> usize {
        self.generate_calls.load(Ordering::SeqCst)
    }

    pub fn embed_calls(&self) -> usize {
        self.embed_calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().ok().and_then(|g| g.clone())
    }

    pub fn last_model(&self) -> Option<String> {
        self.last_model.lock().ok().and_then(|g| g.clone())
    }

    /// Deterministic character-bucket vector, so similar texts score close.
    pub fn bucket_vector(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; 16];
        for c in text.chars().filter(|c| !c.is_whitespace()) {
            vector[(c as usize) % 16] += 1.0;
        }
        vector
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn list_models(&self) -> Result<Vec<ProviderModel>, ApiError> {
        match &self.reply {
            Ok(_) => Ok(self.models.clone()),
            Err(err) => Err(err.clone()),
        }
    }

    async fn generate(&self, request: GenerateRequest, model_id: &str) -> Result<String, ApiError> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut guard) = self.last_prompt.lock() {
            *guard = Some(request.prompt);
        }
        if let Ok(mut guard) = self.last_model.lock() {
            *guard = Some(model_id.to_string());
        }
        self.reply.clone()
    }

    async fn embed(&self, inputs: &[String], _model_id: &str) -> Result<Vec<Vec<f32>>, ApiError> {
        self.embed_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.embed_failure {
            return Err(err.clone());
        }
        Ok(inputs
            .iter()
            .map(|text| {
                self.fixed_vectors
                    .get(text)
                    .cloned()
                    .unwrap_or_else(|| Self::bucket_vector(text))
            })
            .collect())
    }
}
