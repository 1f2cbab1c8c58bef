//! Knowledge base built from every row of a set of spreadsheets.

mod builder;
mod document;
mod index;
mod listener;
mod service;

pub use builder::{build_index, BuildError, BuildReport, SkippedSource};
pub use document::{collect_documents, preview, source_label, KnowledgeDocument};
pub use index::{KnowledgeIndex, SearchHit};
pub use listener::{ChatListener, ChatMessage, ChatReply, FAILED_REPLY};
pub use service::{query_index, KnowledgeBase, QueryAnswer, RebuildSummary, EMPTY_KNOWLEDGE_ANSWER};
