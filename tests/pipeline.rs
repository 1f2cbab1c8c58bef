mod common;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use common::{records_source, row, FakeProvider};
use postcraft_backend::core::errors::ApiError;
use postcraft_backend::knowledge::{build_index, KnowledgeBase, EMPTY_KNOWLEDGE_ANSWER};
use postcraft_backend::llm::{Embedder, GeminiProvider, GenerationClient};
use postcraft_backend::prompt::{
    compose_prompt, decode_references, GenerationRequest, PromptComposer, StyleVariant,
    NO_REFERENCE_MARKER,
};
use postcraft_backend::rag::ReferenceSelector;
use postcraft_backend::records::{load_records, RecordCache};
use postcraft_backend::sheets::{MemorySource, Worksheet};
use postcraft_backend::writer::PostWriter;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request(author: &str, style: StyleVariant) -> GenerationRequest {
    GenerationRequest::new(author, "임플란트 관리", "임플란트 수명", style)
}

#[tokio::test]
async fn selection_is_bounded_and_owned_by_author() {
    let table = load_records(&records_source(), "블로그 포스팅 DB").await;
    let selector = ReferenceSelector::seeded(2024);

    for _ in 0..20 {
        let picked = selector.select(&table, "A", 3);
        assert_eq!(picked.len(), 3);
        assert_eq!(picked.iter().collect::<HashSet<_>>().len(), 3);
        assert!(picked.iter().all(|c| c.starts_with("A 원장의 글")));
    }
    assert_eq!(selector.select(&table, "B", 3), vec!["B 원장의 글".to_string()]);
    assert!(selector.select(&table, "Z", 3).is_empty());
}

#[tokio::test]
async fn absent_author_gets_marker_in_prompt() {
    let table = load_records(&records_source(), "블로그 포스팅 DB").await;
    let refs = ReferenceSelector::seeded(1).select(&table, "없는치과", 3);
    let prompt = compose_prompt(&request("없는치과", StyleVariant::Standard), &refs);
    assert!(prompt.contains(NO_REFERENCE_MARKER));
}

#[test]
fn prompt_carries_only_the_selected_style() {
    let refs = vec!["참고 글".to_string()];
    for style in StyleVariant::ALL {
        let prompt = compose_prompt(&request("A", style), &refs);
        assert!(prompt.contains("임플란트 관리"));
        assert!(prompt.contains("임플란트 수명"));
        let present = StyleVariant::ALL
            .iter()
            .filter(|s| prompt.contains(s.marker()))
            .count();
        assert_eq!(present, 1);
        assert_eq!(prompt, compose_prompt(&request("A", style), &refs));
    }
}

#[test]
fn references_with_separators_survive_encoding() {
    let refs = vec![
        "첫 줄\n---\n셋째 줄".to_string(),
        "<</참고 문서 1>> 처럼 보이는 본문\n\n".to_string(),
    ];
    let prompt = compose_prompt(&request("A", StyleVariant::Faq), &refs);
    assert_eq!(
        decode_references(reference_block(&prompt, StyleVariant::Faq)),
        Some(refs)
    );
}

fn reference_block(prompt: &str, style: StyleVariant) -> &str {
    let start = prompt.find("[참고 문서] 총").expect("block");
    let end = prompt.find(style.marker()).expect("style");
    &prompt[start..end - 1]
}

#[tokio::test]
async fn stored_posts_with_separators_reach_the_model_intact() {
    let provider = FakeProvider::replying("새 글");
    let cache = Arc::new(RecordCache::new(
        Arc::new(records_source()),
        "블로그 포스팅 DB",
        Duration::from_secs(60),
    ));
    let writer = PostWriter::new(
        cache,
        ReferenceSelector::seeded(11),
        PromptComposer::default(),
        GenerationClient::new(provider.clone(), "gemini-3-flash-preview"),
        3,
    );

    let post = writer
        .write(&request("A", StyleVariant::Standard))
        .await
        .expect("post");

    assert_eq!(post.references_used.len(), 3);
    assert!(post.references_used.iter().all(|r| r.contains("\n---\n")));
    let prompt = provider.prompts().pop().expect("prompt");
    assert_eq!(
        decode_references(reference_block(&prompt, StyleVariant::Standard)),
        Some(post.references_used)
    );
}

#[tokio::test]
async fn invalid_api_key_yields_failure_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-3-flash-preview:generateContent"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": { "code": 400, "message": "API key not valid. Please pass a valid API key." }
        })))
        .mount(&server)
        .await;

    let provider = Arc::new(
        GeminiProvider::new(&server.uri(), "bad-key", Duration::from_secs(5)).expect("provider"),
    );
    let cache = Arc::new(RecordCache::new(
        Arc::new(records_source()),
        "블로그 포스팅 DB",
        Duration::from_secs(60),
    ));
    let writer = PostWriter::new(
        cache,
        ReferenceSelector::seeded(9),
        PromptComposer::default(),
        GenerationClient::new(provider, "gemini-3-flash-preview"),
        3,
    );

    let err = writer
        .write(&request("A", StyleVariant::Story))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::BackendFailure(_)));
}

#[tokio::test]
async fn missing_api_key_fails_before_any_request() {
    let err = GeminiProvider::new("http://127.0.0.1:9", "", Duration::from_secs(1))
        .err()
        .expect("error");
    assert!(matches!(err, ApiError::Configuration(_)));
}

fn knowledge_source() -> MemorySource {
    MemorySource::new().with_spreadsheet(
        "SheetA",
        vec![
            Worksheet::new(
                "규정",
                vec![
                    row(&["항목", "내용"]),
                    row(&["연차", "15일"]),
                    row(&["병가", "연 10일"]),
                    row(&["", ""]),
                ],
            ),
            Worksheet::new(
                "안내",
                vec![
                    row(&["질문", "답변"]),
                    row(&["주차", "2시간 무료"]),
                    row(&["야간", "화요일"]),
                    row(&["휴진", "일요일"]),
                ],
            ),
        ],
    )
}

#[tokio::test]
async fn partial_build_skips_missing_source() {
    let provider = FakeProvider::replying("");
    let embedder = Embedder::new(provider, "embedding-001", 2);
    let names = vec!["SheetA".to_string(), "MissingSheet".to_string()];

    let report = build_index(&knowledge_source(), &embedder, &names)
        .await
        .expect("build");

    assert_eq!(report.index.len(), 5);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].name, "MissingSheet");
    assert!(report
        .index
        .documents()
        .iter()
        .any(|d| d.fields_as_text == "[SheetA-안내] 질문: 주차 / 답변: 2시간 무료"));
}

#[tokio::test]
async fn empty_index_query_makes_no_backend_calls() {
    let provider = FakeProvider::replying("should not be used");
    let kb = KnowledgeBase::new(
        Arc::new(MemorySource::new()),
        Embedder::new(provider.clone(), "embedding-001", 32),
        GenerationClient::new(provider.clone(), "gemini-pro"),
        vec!["MissingSheet".to_string()],
    );

    assert!(matches!(kb.rebuild().await, Err(ApiError::EmptyIndex)));
    let answer = kb.query("연차는 며칠?", Some(4)).await.expect("answer");

    assert_eq!(answer.answer, EMPTY_KNOWLEDGE_ANSWER);
    assert_eq!(provider.generate_calls(), 0);
    assert_eq!(provider.embed_calls(), 0);
}

#[tokio::test]
async fn rebuilt_index_answers_from_sources() {
    let provider = FakeProvider::replying("연차는 15일입니다.");
    let kb = KnowledgeBase::new(
        Arc::new(knowledge_source()),
        Embedder::new(provider.clone(), "embedding-001", 32),
        GenerationClient::new(provider.clone(), "gemini-pro"),
        vec!["SheetA".to_string()],
    );

    let summary = kb.rebuild().await.expect("rebuild");
    assert_eq!(summary.documents, 5);

    let answer = kb.query("연차", Some(2)).await.expect("answer");
    assert_eq!(answer.answer, "연차는 15일입니다.");
    assert_eq!(answer.sources.len(), 2);
    let prompt = provider.prompts().pop().expect("prompt");
    assert!(answer.sources.iter().all(|s| prompt.contains(s.as_str())));
}

#[tokio::test]
async fn concurrent_snapshots_share_one_fetch() {
    let source = Arc::new(records_source());
    let cache = Arc::new(RecordCache::new(source.clone(), "블로그 포스팅 DB", Duration::from_secs(60)));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let cache = cache.clone();
            tokio::spawn(async move { cache.snapshot().await.len() })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.await.expect("join"), 7);
    }
    assert_eq!(source.open_count(), 1);
}
