//! Built-in values used when `config.yml` leaves a setting out.

pub const RECORDS_SPREADSHEET: &str = "블로그 포스팅 DB";
pub const RECORDS_CACHE_TTL_SECS: u64 = 3_600;
pub const REFERENCE_COUNT: usize = 3;

pub const GENERATION_MODEL: &str = "gemini-3-flash-preview";
pub const GENERATION_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const GENERATION_TIMEOUT_SECS: u64 = 120;
pub const HASHTAG_COUNT: usize = 5;
pub const MIN_KEYWORD_COUNT: usize = 5;

pub const EMBEDDING_MODEL: &str = "embedding-001";
pub const EMBEDDING_BATCH_SIZE: usize = 32;

pub const KNOWLEDGE_MODEL: &str = "gemini-pro";
pub const KNOWLEDGE_TOP_K: usize = 4;

pub const DRIVE_BASE_URL: &str = "https://www.googleapis.com/drive/v3";
pub const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4";
pub const SHEETS_TIMEOUT_SECS: u64 = 60;

pub const SERVER_HOST: &str = "127.0.0.1";

pub fn knowledge_spreadsheets() -> Vec<String> {
    ["사내_매뉴얼_DB", "블로그_포스팅_DB"]
        .iter()
        .map(|name| name.to_string())
        .collect()
}
