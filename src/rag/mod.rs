//! Retrieval side of the generation pipeline.

mod selector;

pub use selector::{select_references, select_similar, ReferenceSelector};
