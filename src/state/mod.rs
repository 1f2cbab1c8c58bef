use std::sync::Arc;

use crate::core::config::{AppPaths, ConfigService, Settings};
use crate::knowledge::{ChatListener, KnowledgeBase};
use crate::llm::{Embedder, GeminiProvider, GenerationClient, LlmProvider};
use crate::prompt::{PromptComposer, PromptOptions};
use crate::rag::ReferenceSelector;
use crate::records::RecordCache;
use crate::sheets::{GoogleSheetsSource, TabularSource};
use crate::writer::PostWriter;

pub mod error;

use error::InitializationError;

/// Application state shared across all routes and background tasks.
#[derive(Clone)]
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub config: ConfigService,
    pub settings: Settings,
    pub records: Arc<RecordCache>,
    pub writer: Arc<PostWriter>,
    pub knowledge: Arc<KnowledgeBase>,
    pub chat: Arc<ChatListener>,
}

/// The external backends the state is wired to.
pub struct Backends {
    pub source: Arc<dyn TabularSource>,
    pub generation: Arc<dyn LlmProvider>,
    pub embedding: Arc<dyn LlmProvider>,
}

impl AppState {
    /// Loads configuration and connects to Google Sheets and Gemini.
    ///
    /// Missing credentials fail here, before any request is served.
    pub async fn initialize() -> Result<Arc<Self>, InitializationError> {
        let paths = Arc::new(AppPaths::new());
        let config = ConfigService::new(paths.clone());
        let settings = config
            .load_settings()
            .map_err(InitializationError::Config)?;

        let source =
            GoogleSheetsSource::from_settings(&settings.sheets).map_err(InitializationError::Source)?;

        let generation = GeminiProvider::new(
            &settings.generation.base_url,
            settings
                .generation_api_key()
                .map_err(InitializationError::Config)?,
            settings.generation.timeout,
        )
        .map_err(InitializationError::Llm)?;
        let embedding = GeminiProvider::new(
            &settings.generation.base_url,
            settings
                .embedding_api_key()
                .map_err(InitializationError::Config)?,
            settings.generation.timeout,
        )
        .map_err(InitializationError::Llm)?;

        let backends = Backends {
            source: Arc::new(source),
            generation: Arc::new(generation),
            embedding: Arc::new(embedding),
        };
        Ok(Arc::new(Self::with_backends(paths, config, settings, backends)))
    }

    /// Wires the services on top of already-constructed backends.
    pub fn with_backends(
        paths: Arc<AppPaths>,
        config: ConfigService,
        settings: Settings,
        backends: Backends,
    ) -> Self {
        let records = Arc::new(RecordCache::new(
            backends.source.clone(),
            settings.records.spreadsheet.clone(),
            settings.records.cache_ttl,
        ));

        let composer = PromptComposer::new(PromptOptions {
            hashtag_count: settings.generation.hashtag_count,
            min_keyword_count: settings.generation.min_keyword_count,
        });
        let client = GenerationClient::new(backends.generation.clone(), settings.generation.model.clone())
            .with_temperature(settings.generation.temperature);
        let writer = Arc::new(PostWriter::new(
            records.clone(),
            ReferenceSelector::from_os_rng(),
            composer,
            client,
            settings.records.reference_count,
        ));

        let embedder = Embedder::new(
            backends.embedding,
            settings.embedding.model.clone(),
            settings.embedding.batch_size,
        );
        let answerer = GenerationClient::new(backends.generation, settings.knowledge.model.clone());
        let knowledge = Arc::new(
            KnowledgeBase::new(
                backends.source,
                embedder,
                answerer,
                settings.knowledge.spreadsheets.clone(),
            )
            .with_top_k(settings.knowledge.top_k),
        );
        let chat = Arc::new(ChatListener::new(knowledge.clone()));

        Self {
            paths,
            config,
            settings,
            records,
            writer,
            knowledge,
            chat,
        }
    }
}
