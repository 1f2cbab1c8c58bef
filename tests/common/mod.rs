#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use postcraft_backend::core::errors::ApiError;
use postcraft_backend::llm::{GenerateRequest, LlmProvider, ProviderModel};
use postcraft_backend::sheets::{MemorySource, Worksheet};

/// Provider returning a fixed reply and character-count embeddings.
pub struct FakeProvider {
    reply: Result<String, ApiError>,
    generate_calls: AtomicUsize,
    embed_calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl FakeProvider {
    pub fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self::new(Ok(text.to_string())))
    }

    pub fn failing(err: ApiError) -> Arc<Self> {
        Arc::new(Self::new(Err(err)))
    }

    fn new(reply: Result<String, ApiError>) -> Self {
        Self {
            reply,
            generate_calls: AtomicUsize::new(0),
            embed_calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn generate_calls(&self) -> usize {
        self.generate_calls.load(Ordering::SeqCst)
    }

    pub fn embed_calls(&self) -> usize {
        self.embed_calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LlmProvider for FakeProvider {
    fn name(&self) -> &str {
        "fake"
    }

    async fn list_models(&self) -> Result<Vec<ProviderModel>, ApiError> {
        self.reply.clone()?;
        Ok(vec![
            ProviderModel {
                id: "gemini-3-flash-preview".to_string(),
                display_name: "Gemini 3 Flash Preview".to_string(),
                methods: vec!["generateContent".to_string(), "countTokens".to_string()],
            },
            ProviderModel {
                id: "embedding-001".to_string(),
                display_name: "Embedding 001".to_string(),
                methods: vec!["embedContent".to_string()],
            },
        ])
    }

    async fn generate(&self, request: GenerateRequest, _model_id: &str) -> Result<String, ApiError> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(request.prompt);
        }
        self.reply.clone()
    }

    async fn embed(&self, inputs: &[String], _model_id: &str) -> Result<Vec<Vec<f32>>, ApiError> {
        self.embed_calls.fetch_add(1, Ordering::SeqCst);
        Ok(inputs
            .iter()
            .map(|text| {
                let mut v = vec![1.0; 8];
                for c in text.chars() {
                    v[(c as usize) % 8] += 1.0;
                }
                v
            })
            .collect())
    }
}

pub fn row(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|c| c.to_string()).collect()
}

pub const RECORDS_HEADER: [&str; 6] = ["날짜", "치과명", "주제", "파일 위치", "기존 링크", "글 본문"];

/// Records spreadsheet with five posts by "A", one by "B" and one empty post.
pub fn records_source() -> MemorySource {
    let mut values = vec![row(&RECORDS_HEADER)];
    for i in 1..=5 {
        let date = format!("2024-01-0{}", i);
        let content = format!("A 원장의 글 {}\n---\n두 번째 단락", i);
        values.push(row(&[date.as_str(), "A", "주제", "", "", content.as_str()]));
    }
    values.push(row(&["2024-02-01", "B", "교정", "", "", "B 원장의 글"]));
    values.push(row(&["2024-02-02", "A", "빈 글", "", "", "   "]));

    MemorySource::new().with_spreadsheet("블로그 포스팅 DB", vec![Worksheet::new("시트1", values)])
}
