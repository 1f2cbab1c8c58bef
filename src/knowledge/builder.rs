use futures_util::future::join_all;
use serde::Serialize;
use thiserror::Error;

use super::document::{collect_documents, KnowledgeDocument};
use super::index::KnowledgeIndex;
use crate::core::errors::ApiError;
use crate::llm::Embedder;
use crate::sheets::TabularSource;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedSource {
    pub name: String,
    pub reason: String,
}

#[derive(Debug)]
pub struct BuildReport {
    pub index: KnowledgeIndex,
    pub loaded: Vec<String>,
    pub skipped: Vec<SkippedSource>,
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("empty index: no documents collected ({} sources skipped)", skipped.len())]
    Empty { skipped: Vec<SkippedSource> },
    #[error("embedding failed: {0}")]
    Embedding(#[source] ApiError),
}

impl From<BuildError> for ApiError {
    fn from(err: BuildError) -> Self {
        match err {
            BuildError::Empty { .. } => ApiError::EmptyIndex,
            BuildError::Embedding(inner) => inner,
        }
    }
}

/// Read every row of every tab of `names` and embed them into a fresh index.
///
/// Unavailable spreadsheets are logged and reported as skipped. The build
/// fails only when nothing was collected or embedding fails.
pub async fn build_index(
    source: &dyn TabularSource,
    embedder: &Embedder,
    names: &[String],
) -> Result<BuildReport, BuildError> {
    tracing::info!("Building knowledge index from {} spreadsheets", names.len());

    let opened = join_all(names.iter().map(|name| source.open(name))).await;

    let mut documents: Vec<KnowledgeDocument> = Vec::new();
    let mut loaded = Vec::new();
    let mut skipped = Vec::new();

    for (name, result) in names.iter().zip(opened) {
        match result {
            Ok(spreadsheet) => {
                let collected = collect_documents(&spreadsheet);
                tracing::info!(
                    "Read {} rows from '{}' ({} tabs)",
                    collected.len(),
                    name,
                    spreadsheet.worksheets.len()
                );
                documents.extend(collected);
                loaded.push(name.clone());
            }
            Err(err) => {
                tracing::warn!("Skipping spreadsheet '{}': {}", name, err);
                skipped.push(SkippedSource {
                    name: name.clone(),
                    reason: err.to_string(),
                });
            }
        }
    }

    if documents.is_empty() {
        tracing::warn!("No documents collected from any spreadsheet");
        return Err(BuildError::Empty { skipped });
    }

    let texts: Vec<String> = documents
        .iter()
        .map(|doc| doc.fields_as_text.clone())
        .collect();
    let embeddings = embedder
        .embed_documents(&texts)
        .await
        .map_err(BuildError::Embedding)?;
    let index = KnowledgeIndex::new(documents, embeddings, embedder.model())
        .map_err(BuildError::Embedding)?;

    tracing::info!("Knowledge index built with {} documents", index.len());

    Ok(BuildReport {
        index,
        loaded,
        skipped,
    })
}
