//! Vector retrieval over the classical-text corpus.
//!
//! Chunks are loaded once at startup and held in memory (the corpus is
//! read-only at runtime). The query is embedded once, then each source is
//! searched independently; a missing embedder degrades to empty context —
//! the prompts tolerate having no classics at all.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use saju_llm::provider::EmbeddingProvider;

pub const SIMILARITY_THRESHOLD: f32 = 0.3;
pub const TOP_K_PER_SOURCE: usize = 2;

/// The three classical sources in the corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    A,
    B,
    C,
}

impl Source {
    pub fn all() -> [Source; 3] {
        [Source::A, Source::B, Source::C]
    }

    pub fn title(&self) -> &'static str {
        match self {
            Source::A => "적천수",
            Source::B => "자평진전",
            Source::C => "궁통보감",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Source::A => "A",
            Source::B => "B",
            Source::C => "C",
        }
    }
}

impl std::str::FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "A" => Ok(Source::A),
            "B" => Ok(Source::B),
            "C" => Ok(Source::C),
            other => Err(format!("unknown classics source: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassicsChunk {
    pub source: Source,
    pub section: String,
    pub content: String,
    pub embedding: Vec<f32>,
}

/// In-memory corpus index. Built once from the store at startup.
pub struct ClassicsIndex {
    chunks: Vec<ClassicsChunk>,
}

impl ClassicsIndex {
    pub fn new(chunks: Vec<ClassicsChunk>) -> Self {
        Self { chunks }
    }

    pub fn empty() -> Self {
        Self { chunks: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Top-k chunks of one source above the similarity threshold.
    pub fn search(&self, query: &[f32], source: Source, k: usize) -> Vec<&ClassicsChunk> {
        let mut scored: Vec<(f32, &ClassicsChunk)> = self
            .chunks
            .iter()
            .filter(|c| c.source == source)
            .filter_map(|c| {
                let sim = cosine_similarity(query, &c.embedding)?;
                (sim >= SIMILARITY_THRESHOLD).then_some((sim, c))
            })
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.into_iter().take(k).map(|(_, c)| c).collect()
    }
}

/// None when dimensions mismatch or either vector is zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }
    let mut dot = 0.0f32;
    let mut na = 0.0f32;
    let mut nb = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 {
        return None;
    }
    Some(dot / (na.sqrt() * nb.sqrt()))
}

pub struct ClassicsRetriever {
    index: Arc<ClassicsIndex>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
}

impl ClassicsRetriever {
    pub fn new(index: Arc<ClassicsIndex>, embedder: Option<Arc<dyn EmbeddingProvider>>) -> Self {
        Self { index, embedder }
    }

    /// Retrieve grounding passages for a query: up to `TOP_K_PER_SOURCE` per
    /// source, formatted as "제목(절): 내용". Every failure path degrades to
    /// fewer (possibly zero) passages.
    pub async fn retrieve(&self, query: &str) -> Vec<String> {
        let embedder = match &self.embedder {
            Some(e) => e,
            None => return Vec::new(),
        };
        if self.index.is_empty() {
            return Vec::new();
        }

        let query_vec = match embedder.embed(query).await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "query embedding failed — serving without classics");
                return Vec::new();
            }
        };

        let mut out = Vec::new();
        for source in Source::all() {
            let hits = self.index.search(&query_vec, source, TOP_K_PER_SOURCE);
            debug!(source = source.code(), hits = hits.len(), "classics search");
            for chunk in hits {
                out.push(format!(
                    "{}({}): {}",
                    source.title(),
                    chunk.section,
                    chunk.content
                ));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use saju_llm::provider::ProviderError;

    fn chunk(source: Source, section: &str, content: &str, embedding: Vec<f32>) -> ClassicsChunk {
        ClassicsChunk {
            source,
            section: section.into(),
            content: content.into(),
            embedding,
        }
    }

    #[test]
    fn cosine_basics() {
        assert!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]).unwrap() > 0.99);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap().abs() < 1e-6);
        assert!(cosine_similarity(&[1.0], &[1.0, 0.0]).is_none());
        assert!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]).is_none());
    }

    #[test]
    fn search_respects_threshold_and_k() {
        let index = ClassicsIndex::new(vec![
            chunk(Source::A, "1", "가까운 구절", vec![1.0, 0.0]),
            chunk(Source::A, "2", "조금 먼 구절", vec![0.8, 0.6]),
            chunk(Source::A, "3", "반대 구절", vec![-1.0, 0.0]),
            chunk(Source::B, "1", "다른 소스", vec![1.0, 0.0]),
        ]);
        let hits = index.search(&[1.0, 0.0], Source::A, 2);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].section, "1");
        // Source filter.
        let b_hits = index.search(&[1.0, 0.0], Source::B, 2);
        assert_eq!(b_hits.len(), 1);
    }

    struct FixedEmbedder(Vec<f32>);

    #[async_trait]
    impl saju_llm::provider::EmbeddingProvider for FixedEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, ProviderError> {
            Ok(self.0.clone())
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl saju_llm::provider::EmbeddingProvider for FailingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, ProviderError> {
            Err(ProviderError::Timeout { ms: 1 })
        }
    }

    #[tokio::test]
    async fn retrieval_collects_per_source() {
        let index = Arc::new(ClassicsIndex::new(vec![
            chunk(Source::A, "갑목론", "갑목은 곧다", vec![1.0, 0.0]),
            chunk(Source::B, "용신론", "억부가 먼저다", vec![0.9, 0.1]),
        ]));
        let retriever =
            ClassicsRetriever::new(index, Some(Arc::new(FixedEmbedder(vec![1.0, 0.0]))));
        let passages = retriever.retrieve("갑목 성격").await;
        assert_eq!(passages.len(), 2);
        assert!(passages[0].starts_with("적천수"));
        assert!(passages[1].starts_with("자평진전"));
    }

    #[tokio::test]
    async fn embedding_failure_degrades_to_empty() {
        let index = Arc::new(ClassicsIndex::new(vec![chunk(
            Source::A,
            "x",
            "y",
            vec![1.0],
        )]));
        let retriever = ClassicsRetriever::new(index, Some(Arc::new(FailingEmbedder)));
        assert!(retriever.retrieve("질문").await.is_empty());
    }

    #[tokio::test]
    async fn no_embedder_is_empty_context() {
        let retriever = ClassicsRetriever::new(Arc::new(ClassicsIndex::empty()), None);
        assert!(retriever.retrieve("질문").await.is_empty());
    }
}
