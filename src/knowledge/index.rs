use chrono::{DateTime, Utc};
use serde::Serialize;

use super::document::KnowledgeDocument;
use crate::core::errors::ApiError;
use crate::vector_math::rank_descending_by_cosine;

/// Embedded documents searchable by cosine similarity.
#[derive(Debug, Clone)]
pub struct KnowledgeIndex {
    documents: Vec<KnowledgeDocument>,
    embeddings: Vec<Vec<f32>>,
    embedding_model: String,
    built_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub document: KnowledgeDocument,
    pub score: f32,
}

impl KnowledgeIndex {
    pub fn new(
        documents: Vec<KnowledgeDocument>,
        embeddings: Vec<Vec<f32>>,
        embedding_model: impl Into<String>,
    ) -> Result<Self, ApiError> {
        if documents.len() != embeddings.len() {
            return Err(ApiError::Internal(format!(
                "{} documents but {} embeddings",
                documents.len(),
                embeddings.len()
            )));
        }
        if let Some(first) = embeddings.first() {
            let dimension = first.len();
            if dimension == 0 || embeddings.iter().any(|v| v.len() != dimension) {
                return Err(ApiError::BackendFailure(
                    "Embeddings have inconsistent dimensions".to_string(),
                ));
            }
        }

        Ok(Self {
            documents,
            embeddings,
            embedding_model: embedding_model.into(),
            built_at: Utc::now(),
        })
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn documents(&self) -> &[KnowledgeDocument] {
        &self.documents
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    pub fn dimension(&self) -> Option<usize> {
        self.embeddings.first().map(Vec::len)
    }

    /// The `k` nearest documents, best first.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>, ApiError> {
        if self.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if self.dimension() != Some(query.len()) {
            return Err(ApiError::BackendFailure(format!(
                "Query embedding has {} dimensions, index has {:?}",
                query.len(),
                self.dimension()
            )));
        }

        let ranked = rank_descending_by_cosine(query, &self.embeddings)?;
        Ok(ranked
            .into_iter()
            .take(k)
            .map(|(idx, score)| SearchHit {
                document: self.documents[idx].clone(),
                score,
            })
            .collect())
    }
}
