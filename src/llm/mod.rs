pub mod gemini;
pub mod provider;
pub mod service;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use gemini::GeminiProvider;
pub use provider::LlmProvider;
pub use service::{Embedder, GenerationClient};
pub use types::{GenerateRequest, ProviderModel};
