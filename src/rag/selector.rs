//! Reference selection for style conditioning.
//!
//! Simple mode samples an author's past posts uniformly without
//! replacement; the random source is injected so a fixed seed gives a
//! reproducible selection. Similarity mode ranks knowledge documents
//! against a query embedding.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::core::errors::ApiError;
use crate::knowledge::KnowledgeIndex;
use crate::llm::Embedder;
use crate::records::RecordTable;

/// Up to `count` contents from `author`'s eligible records, drawn uniformly
/// without replacement. Unknown authors yield an empty set.
pub fn select_references<R: Rng + ?Sized>(
    records: &RecordTable,
    author: &str,
    count: usize,
    rng: &mut R,
) -> Vec<String> {
    let candidates: Vec<&str> = records
        .by_author(author)
        .map(|record| record.content.as_str())
        .collect();

    let amount = count.min(candidates.len());
    if amount == 0 {
        return Vec::new();
    }

    rand::seq::index::sample(rng, candidates.len(), amount)
        .into_iter()
        .map(|idx| candidates[idx].to_string())
        .collect()
}

pub struct ReferenceSelector {
    rng: Mutex<StdRng>,
}

impl ReferenceSelector {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn from_os_rng() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    pub fn select(&self, records: &RecordTable, author: &str, count: usize) -> Vec<String> {
        match self.rng.lock() {
            Ok(mut rng) => select_references(records, author, count, &mut *rng),
            Err(poisoned) => select_references(records, author, count, &mut *poisoned.into_inner()),
        }
    }
}

/// Top-`k` knowledge documents for `query`, best first.
///
/// Deterministic for a fixed index and query embedding.
pub async fn select_similar(
    index: &KnowledgeIndex,
    embedder: &Embedder,
    query: &str,
    k: usize,
) -> Result<Vec<String>, ApiError> {
    if index.is_empty() || k == 0 {
        return Ok(Vec::new());
    }
    let query_vector = embedder.embed_query(query).await?;
    Ok(index
        .search(&query_vector, k)?
        .into_iter()
        .map(|hit| hit.document.fields_as_text)
        .collect())
}
