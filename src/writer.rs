//! End-to-end post generation: records → references → prompt → model.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::core::errors::ApiError;
use crate::knowledge::preview;
use crate::llm::GenerationClient;
use crate::prompt::{GenerationRequest, PromptComposer};
use crate::rag::ReferenceSelector;
use crate::records::RecordCache;

pub const PREVIEW_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedPost {
    pub body_text: String,
    pub references_used: Vec<String>,
}

pub struct PostWriter {
    records: Arc<RecordCache>,
    selector: ReferenceSelector,
    composer: PromptComposer,
    client: GenerationClient,
    reference_count: usize,
}

impl PostWriter {
    pub fn new(
        records: Arc<RecordCache>,
        selector: ReferenceSelector,
        composer: PromptComposer,
        client: GenerationClient,
        reference_count: usize,
    ) -> Self {
        Self {
            records,
            selector,
            composer,
            client,
            reference_count,
        }
    }

    pub fn records(&self) -> &Arc<RecordCache> {
        &self.records
    }

    pub fn client(&self) -> &GenerationClient {
        &self.client
    }

    pub async fn write(&self, request: &GenerationRequest) -> Result<GeneratedPost, ApiError> {
        request.validate()?;
        let request_id = Uuid::new_v4();

        let table = self.records.snapshot().await;
        let references = self
            .selector
            .select(&table, &request.author, self.reference_count);
        if references.is_empty() {
            tracing::warn!(
                %request_id,
                "No past posts for author '{}', writing without references",
                request.author
            );
        } else {
            tracing::info!(
                %request_id,
                "Selected {} reference posts for '{}'",
                references.len(),
                request.author
            );
        }

        let instruction = self.composer.compose(request, &references);
        let body_text = self.client.generate(&instruction).await.map_err(|err| {
            tracing::error!(%request_id, "Post generation failed: {}", err);
            err
        })?;

        tracing::info!(%request_id, "Generated {} chars ({})", body_text.chars().count(), request.style);
        Ok(GeneratedPost {
            body_text,
            references_used: references,
        })
    }
}

pub fn reference_previews(references: &[String], max_chars: usize) -> Vec<String> {
    references.iter().map(|r| preview(r, max_chars)).collect()
}
