use serde::{Deserialize, Serialize};

/// One-shot text completion request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerateRequest {
    pub prompt: String,
    pub temperature: Option<f64>,
    pub max_output_tokens: Option<u32>,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            temperature: None,
            max_output_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: Option<f64>) -> Self {
        self.temperature = temperature.or(self.temperature);
        self
    }
}

pub const GENERATE_METHOD: &str = "generateContent";

/// A model the backend advertises, with the actions it accepts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderModel {
    pub id: String,
    pub display_name: String,
    pub methods: Vec<String>,
}

impl ProviderModel {
    pub fn supports_generation(&self) -> bool {
        self.methods.iter().any(|m| m == GENERATE_METHOD)
    }
}
