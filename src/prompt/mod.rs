//! Instruction building for style-conditioned post generation.

mod composer;
mod references;
mod style;

use serde::{Deserialize, Serialize};

use crate::core::config::defaults;
use crate::core::errors::ApiError;

pub use composer::PromptComposer;
pub use references::{decode_references, encode_references, NO_REFERENCE_MARKER};
pub use style::{StyleVariant, UnknownStyle};

/// Everything that determines the composed prompt, apart from the references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub author: String,
    pub topic: String,
    pub keyword: String,
    #[serde(default)]
    pub style: StyleVariant,
    #[serde(default)]
    pub context_note: Option<String>,
}

impl GenerationRequest {
    pub fn new(
        author: impl Into<String>,
        topic: impl Into<String>,
        keyword: impl Into<String>,
        style: StyleVariant,
    ) -> Self {
        Self {
            author: author.into(),
            topic: topic.into(),
            keyword: keyword.into(),
            style,
            context_note: None,
        }
    }

    pub fn with_context_note(mut self, note: impl Into<String>) -> Self {
        self.context_note = Some(note.into());
        self
    }

    /// The context note, if it carries any text.
    pub fn context_note(&self) -> Option<&str> {
        self.context_note
            .as_deref()
            .map(str::trim)
            .filter(|note| !note.is_empty())
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        if self.author.is_empty() {
            return Err(ApiError::BadRequest("author is required".to_string()));
        }
        if self.topic.trim().is_empty() || self.keyword.trim().is_empty() {
            return Err(ApiError::BadRequest(
                "topic and keyword are both required".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptOptions {
    pub hashtag_count: usize,
    pub min_keyword_count: usize,
}

impl Default for PromptOptions {
    fn default() -> Self {
        Self {
            hashtag_count: defaults::HASHTAG_COUNT,
            min_keyword_count: defaults::MIN_KEYWORD_COUNT,
        }
    }
}

/// Compose with default options.
pub fn compose_prompt(request: &GenerationRequest, references: &[String]) -> String {
    PromptComposer::default().compose(request, references)
}
