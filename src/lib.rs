pub mod core;
pub mod knowledge;
pub mod llm;
pub mod logging;
pub mod prompt;
pub mod rag;
pub mod records;
pub mod server;
pub mod sheets;
pub mod state;
pub mod vector_math;
pub mod writer;
