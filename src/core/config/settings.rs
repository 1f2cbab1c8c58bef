use std::time::Duration;

use serde_json::Value;

use super::defaults;
use crate::core::errors::ApiError;

/// Typed view over the merged YAML config.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub records: RecordSettings,
    pub generation: GenerationSettings,
    pub embedding: EmbeddingSettings,
    pub knowledge: KnowledgeSettings,
    pub sheets: SheetsSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct RecordSettings {
    pub spreadsheet: String,
    pub cache_ttl: Duration,
    pub reference_count: usize,
}

#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
    pub temperature: Option<f64>,
    pub hashtag_count: usize,
    pub min_keyword_count: usize,
}

#[derive(Debug, Clone)]
pub struct EmbeddingSettings {
    pub model: String,
    pub api_key: Option<String>,
    pub batch_size: usize,
}

#[derive(Debug, Clone)]
pub struct KnowledgeSettings {
    pub spreadsheets: Vec<String>,
    pub model: String,
    pub top_k: usize,
}

#[derive(Debug, Clone)]
pub struct SheetsSettings {
    pub access_token: Option<String>,
    pub drive_base_url: String,
    pub sheets_base_url: String,
    pub timeout: Duration,
}

impl Settings {
    pub fn from_value(config: &Value) -> Self {
        let server = section(config, "server");
        let records = section(config, "records");
        let generation = section(config, "generation");
        let embedding = section(config, "embedding");
        let knowledge = section(config, "knowledge");
        let sheets = section(config, "sheets");

        Settings {
            server: ServerSettings {
                host: string_or(server, "host", defaults::SERVER_HOST),
                port: server
                    .and_then(|s| s.get("port"))
                    .and_then(|v| v.as_u64())
                    .and_then(|v| u16::try_from(v).ok())
                    .unwrap_or(0),
                cors_allowed_origins: string_list(server, "cors_allowed_origins")
                    .unwrap_or_default(),
            },
            records: RecordSettings {
                spreadsheet: string_or(records, "spreadsheet", defaults::RECORDS_SPREADSHEET),
                cache_ttl: Duration::from_secs(u64_or(
                    records,
                    "cache_ttl_secs",
                    defaults::RECORDS_CACHE_TTL_SECS,
                )),
                reference_count: usize_or(records, "reference_count", defaults::REFERENCE_COUNT),
            },
            generation: GenerationSettings {
                model: string_or(generation, "model", defaults::GENERATION_MODEL),
                api_key: non_blank(generation, "api_key"),
                base_url: string_or(generation, "base_url", defaults::GENERATION_BASE_URL),
                timeout: Duration::from_secs(u64_or(
                    generation,
                    "timeout_secs",
                    defaults::GENERATION_TIMEOUT_SECS,
                )),
                temperature: generation
                    .and_then(|s| s.get("temperature"))
                    .and_then(|v| v.as_f64()),
                hashtag_count: usize_or(generation, "hashtag_count", defaults::HASHTAG_COUNT),
                min_keyword_count: usize_or(
                    generation,
                    "min_keyword_count",
                    defaults::MIN_KEYWORD_COUNT,
                ),
            },
            embedding: EmbeddingSettings {
                model: string_or(embedding, "model", defaults::EMBEDDING_MODEL),
                api_key: non_blank(embedding, "api_key"),
                batch_size: usize_or(embedding, "batch_size", defaults::EMBEDDING_BATCH_SIZE),
            },
            knowledge: KnowledgeSettings {
                spreadsheets: string_list(knowledge, "spreadsheets")
                    .unwrap_or_else(defaults::knowledge_spreadsheets),
                model: string_or(knowledge, "model", defaults::KNOWLEDGE_MODEL),
                top_k: usize_or(knowledge, "top_k", defaults::KNOWLEDGE_TOP_K),
            },
            sheets: SheetsSettings {
                access_token: non_blank(sheets, "access_token"),
                drive_base_url: string_or(sheets, "drive_base_url", defaults::DRIVE_BASE_URL),
                sheets_base_url: string_or(sheets, "sheets_base_url", defaults::SHEETS_BASE_URL),
                timeout: Duration::from_secs(u64_or(
                    sheets,
                    "timeout_secs",
                    defaults::SHEETS_TIMEOUT_SECS,
                )),
            },
        }
    }

    pub fn generation_api_key(&self) -> Result<&str, ApiError> {
        self.generation
            .api_key
            .as_deref()
            .ok_or_else(|| ApiError::Configuration("generation.api_key is not set".to_string()))
    }

    /// The embedding key falls back to the generation key.
    pub fn embedding_api_key(&self) -> Result<&str, ApiError> {
        self.embedding
            .api_key
            .as_deref()
            .or(self.generation.api_key.as_deref())
            .ok_or_else(|| ApiError::Configuration("embedding.api_key is not set".to_string()))
    }
}

fn section<'a>(config: &'a Value, key: &str) -> Option<&'a Value> {
    config.get(key).filter(|v| v.is_object())
}

fn string_or(section: Option<&Value>, key: &str, default: &str) -> String {
    section
        .and_then(|s| s.get(key))
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
        .to_string()
}

fn non_blank(section: Option<&Value>, key: &str) -> Option<String> {
    section
        .and_then(|s| s.get(key))
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn u64_or(section: Option<&Value>, key: &str, default: u64) -> u64 {
    section
        .and_then(|s| s.get(key))
        .and_then(|v| v.as_u64())
        .unwrap_or(default)
}

fn usize_or(section: Option<&Value>, key: &str, default: usize) -> usize {
    section
        .and_then(|s| s.get(key))
        .and_then(|v| v.as_u64())
        .and_then(|v| usize::try_from(v).ok())
        .unwrap_or(default)
}

fn string_list(section: Option<&Value>, key: &str) -> Option<Vec<String>> {
    section.and_then(|s| s.get(key)).and_then(|v| v.as_array()).map(|items| {
        items
            .iter()
            .filter_map(|item| item.as_str())
            .map(str::to_string)
            .collect()
    })
}
