use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, RwLock};

use super::builder::{build_index, SkippedSource};
use super::document::preview;
use super::index::KnowledgeIndex;
use crate::core::config::defaults;
use crate::core::errors::ApiError;
use crate::llm::{Embedder, GenerationClient};
use crate::rag::select_similar;
use crate::sheets::TabularSource;

pub const EMPTY_KNOWLEDGE_ANSWER: &str = "지식 DB가 비어있거나 로딩되지 않았습니다.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryAnswer {
    pub answer: String,
    pub sources: Vec<String>,
}

impl QueryAnswer {
    fn empty() -> Self {
        Self {
            answer: EMPTY_KNOWLEDGE_ANSWER.to_string(),
            sources: Vec::new(),
        }
    }

    pub fn source_previews(&self, max_chars: usize) -> Vec<String> {
        self.sources.iter().map(|s| preview(s, max_chars)).collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RebuildSummary {
    pub documents: usize,
    pub skipped: Vec<SkippedSource>,
}

/// The live knowledge index plus everything needed to rebuild and query it.
///
/// Queries read whichever index is current; a rebuild replaces it only once
/// the new one is complete. At most one rebuild runs at a time.
pub struct KnowledgeBase {
    source: Arc<dyn TabularSource>,
    embedder: Embedder,
    answerer: GenerationClient,
    spreadsheets: Vec<String>,
    top_k: usize,
    index: RwLock<Option<Arc<KnowledgeIndex>>>,
    rebuild_lock: Mutex<()>,
}

impl KnowledgeBase {
    pub fn new(
        source: Arc<dyn TabularSource>,
        embedder: Embedder,
        answerer: GenerationClient,
        spreadsheets: Vec<String>,
    ) -> Self {
        Self {
            source,
            embedder,
            answerer: answerer.with_temperature(Some(0.0)),
            spreadsheets,
            top_k: defaults::KNOWLEDGE_TOP_K,
            index: RwLock::new(None),
            rebuild_lock: Mutex::new(()),
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub fn spreadsheets(&self) -> &[String] {
        &self.spreadsheets
    }

    pub fn embedder(&self) -> &Embedder {
        &self.embedder
    }

    pub async fn current(&self) -> Option<Arc<KnowledgeIndex>> {
        self.index.read().await.clone()
    }

    /// Build a fresh index from the configured spreadsheets and swap it in.
    pub async fn rebuild(&self) -> Result<RebuildSummary, ApiError> {
        let Ok(_guard) = self.rebuild_lock.try_lock() else {
            return Err(ApiError::Conflict(
                "A knowledge index rebuild is already running".to_string(),
            ));
        };

        let report = build_index(self.source.as_ref(), &self.embedder, &self.spreadsheets)
            .await
            .map_err(|err| {
                tracing::warn!("Knowledge rebuild failed, keeping previous index: {}", err);
                ApiError::from(err)
            })?;

        let summary = RebuildSummary {
            documents: report.index.len(),
            skipped: report.skipped,
        };
        *self.index.write().await = Some(Arc::new(report.index));
        tracing::info!(
            "Knowledge index swapped in ({} documents, {} sources skipped)",
            summary.documents,
            summary.skipped.len()
        );
        Ok(summary)
    }

    /// Install an already-built index.
    pub async fn install(&self, index: KnowledgeIndex) {
        *self.index.write().await = Some(Arc::new(index));
    }

    pub async fn query(&self, text: &str, k: Option<usize>) -> Result<QueryAnswer, ApiError> {
        let index = self.current().await;
        query_index(
            index.as_deref(),
            &self.embedder,
            &self.answerer,
            text,
            k.unwrap_or(self.top_k),
        )
        .await
    }
}

/// Answer `text` from the `k` nearest documents of `index`.
///
/// A missing or empty index answers with [`EMPTY_KNOWLEDGE_ANSWER`] without
/// touching the embedding or generation backends.
pub async fn query_index(
    index: Option<&KnowledgeIndex>,
    embedder: &Embedder,
    answerer: &GenerationClient,
    text: &str,
    k: usize,
) -> Result<QueryAnswer, ApiError> {
    let index = match index {
        Some(index) if !index.is_empty() => index,
        _ => return Ok(QueryAnswer::empty()),
    };
    if text.trim().is_empty() {
        return Err(ApiError::BadRequest("query text is required".to_string()));
    }
    if embedder.model() != index.embedding_model() {
        return Err(ApiError::Internal(format!(
            "Index was built with '{}' but queries use '{}'",
            index.embedding_model(),
            embedder.model()
        )));
    }

    let sources = select_similar(index, embedder, text, k.max(1)).await?;

    let answer = answerer.generate(&answer_prompt(text, &sources)).await?;
    Ok(QueryAnswer { answer, sources })
}

fn answer_prompt(question: &str, sources: &[String]) -> String {
    let mut prompt = String::from(
        "다음 사내 문서 내용만을 근거로 질문에 답하세요.\n\
         문서에 없는 내용은 추측하지 말고 모른다고 답하세요.\n\n[문서]\n",
    );
    for source in sources {
        prompt.push_str(source);
        prompt.push('\n');
    }
    prompt.push_str(&format!("\n[질문]\n{}\n\n[답변]\n", question));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedProvider;
    use crate::sheets::{MemorySource, Worksheet};

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn source() -> Arc<MemorySource> {
        Arc::new(MemorySource::new().with_spreadsheet(
            "매뉴얼",
            vec![Worksheet::new(
                "진료",
                vec![
                    row(&["항목", "내용"]),
                    row(&["야간 진료", "화요일 21시까지"]),
                    row(&["주차", "건물 지하 2시간 무료"]),
                ],
            )],
        ))
    }

    fn base(provider: Arc<ScriptedProvider>, source: Arc<MemorySource>) -> KnowledgeBase {
        KnowledgeBase::new(
            source,
            Embedder::new(provider.clone(), "embedding-001", 32),
            GenerationClient::new(provider, "gemini-pro"),
            vec!["매뉴얼".to_string()],
        )
    }

    #[tokio::test]
    async fn unbuilt_index_answers_without_backend_calls() {
        let provider = Arc::new(ScriptedProvider::replying("unused"));
        let kb = base(provider.clone(), source());

        let answer = kb.query("주차 되나요?", None).await.expect("query");

        assert_eq!(answer.answer, EMPTY_KNOWLEDGE_ANSWER);
        assert!(answer.sources.is_empty());
        assert_eq!(provider.generate_calls(), 0);
        assert_eq!(provider.embed_calls(), 0);
    }

    fn axis(i: usize) -> Vec<f32> {
        let mut v = vec![0.0; 16];
        v[i] = 1.0;
        v
    }

    #[tokio::test]
    async fn query_after_rebuild_uses_nearest_sources() {
        let provider = Arc::new(
            ScriptedProvider::replying("지하 주차장을 이용하세요.")
                .with_vector("[매뉴얼-진료] 항목: 야간 진료 / 내용: 화요일 21시까지", axis(0))
                .with_vector("[매뉴얼-진료] 항목: 주차 / 내용: 건물 지하 2시간 무료", axis(1))
                .with_vector("주차 되나요?", axis(1)),
        );
        let kb = base(provider.clone(), source()).with_top_k(1);

        let summary = kb.rebuild().await.expect("rebuild");
        assert_eq!(summary.documents, 2);

        let answer = kb.query("주차 되나요?", None).await.expect("query");
        assert_eq!(answer.answer, "지하 주차장을 이용하세요.");
        assert_eq!(
            answer.sources,
            vec!["[매뉴얼-진료] 항목: 주차 / 내용: 건물 지하 2시간 무료".to_string()]
        );

        let prompt = provider.last_prompt().expect("prompt");
        assert!(prompt.contains(&answer.sources[0]));
        assert_eq!(provider.last_model().as_deref(), Some("gemini-pro"));
    }

    #[tokio::test]
    async fn failed_rebuild_keeps_previous_index() {
        let provider = Arc::new(ScriptedProvider::replying("ok"));
        let source = source();
        let kb = base(provider, source.clone());
        kb.rebuild().await.expect("first rebuild");

        source.deny("매뉴얼");
        let err = kb.rebuild().await.unwrap_err();
        assert!(matches!(err, ApiError::EmptyIndex));

        let current = kb.current().await.expect("index kept");
        assert_eq!(current.len(), 2);
    }

    #[tokio::test]
    async fn concurrent_rebuild_is_rejected() {
        let provider = Arc::new(ScriptedProvider::replying("ok"));
        let kb = base(provider, source());

        let _held = kb.rebuild_lock.lock().await;
        let err = kb.rebuild().await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn mismatched_embedding_model_is_rejected() {
        let provider = Arc::new(ScriptedProvider::replying("ok"));
        let kb = base(provider.clone(), source());
        let stale = KnowledgeIndex::new(
            vec![crate::knowledge::KnowledgeDocument::new("x", "[x] a: b")],
            vec![vec![1.0; 16]],
            "other-model",
        )
        .expect("index");
        kb.install(stale).await;

        assert!(kb.query("a", None).await.is_err());
        assert_eq!(provider.generate_calls(), 0);
    }

    #[test]
    fn answer_prompt_carries_question_and_sources() {
        let prompt = answer_prompt("주차?", &["[m-t] 항목: 주차".to_string()]);
        assert!(prompt.contains("[m-t] 항목: 주차"));
        assert!(prompt.contains("[질문]\n주차?"));
    }
}
