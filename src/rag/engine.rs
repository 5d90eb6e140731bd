//! Retrieval engine.
//!
//! Owns the one-time index build and the per-query path: embed the query
//! with the same provider used at build time, search the index, optionally
//! post-filter by zone and assemble the grounding context string.

use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::core::errors::ApiError;
use crate::data::ZoneSource;
use crate::llm::LlmProvider;
use crate::rag::corpus::build_corpus;
use crate::rag::index::EmbeddingIndex;
use crate::rag::record::Record;

/// Default number of hits used for context assembly.
pub const CONTEXT_TOP_K: usize = 5;

/// Result of a context lookup.
///
/// `NotFound` is a normal outcome (empty corpus, no hits, or all hits
/// filtered away), distinct from transport failures which surface as errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextOutcome {
    Found(String),
    NotFound,
}

impl ContextOutcome {
    /// Context text for prompt assembly; empty string when nothing matched.
    pub fn as_text(&self) -> &str {
        match self {
            ContextOutcome::Found(text) => text,
            ContextOutcome::NotFound => "",
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, ContextOutcome::Found(_))
    }
}

/// Embedding-backed retrieval over the zone corpus.
///
/// The index is built lazily, exactly once per process. An empty corpus is
/// not an error: the engine then degrades to always-empty results.
pub struct RetrievalEngine {
    source: Arc<dyn ZoneSource>,
    llm: Arc<dyn LlmProvider>,
    embedding_model: String,
    index: OnceCell<Option<EmbeddingIndex>>,
}

impl RetrievalEngine {
    pub fn new(
        source: Arc<dyn ZoneSource>,
        llm: Arc<dyn LlmProvider>,
        embedding_model: String,
    ) -> Self {
        Self {
            source,
            llm,
            embedding_model,
            index: OnceCell::new(),
        }
    }

    /// Build the index now instead of on the first query.
    pub async fn ensure_built(&self) -> Result<(), ApiError> {
        self.index().await.map(|_| ())
    }

    /// Number of records in the built index, if any.
    pub async fn corpus_size(&self) -> Result<usize, ApiError> {
        Ok(self.index().await?.as_ref().map_or(0, EmbeddingIndex::len))
    }

    async fn index(&self) -> Result<&Option<EmbeddingIndex>, ApiError> {
        self.index
            .get_or_try_init(|| async {
                let records = build_corpus(self.source.as_ref());
                if records.is_empty() {
                    tracing::warn!("Zone corpus is empty; retrieval will return no results");
                    return Ok(None);
                }

                let contents: Vec<String> =
                    records.iter().map(|r| r.content.clone()).collect();
                let embeddings = self.llm.embed(&contents, &self.embedding_model).await?;
                let index = EmbeddingIndex::build(records, embeddings)?;
                tracing::info!(
                    records = index.len(),
                    dimension = index.dimension(),
                    "Embedding index built"
                );
                Ok(Some(index))
            })
            .await
    }

    /// Top-`top_k` records for a query, in ascending distance order.
    ///
    /// Returns an empty list when the corpus is empty; never an error for
    /// that case.
    pub async fn query(&self, text: &str, top_k: usize) -> Result<Vec<Record>, ApiError> {
        let Some(index) = self.index().await? else {
            return Ok(vec![]);
        };

        let embeddings = self.llm.embed(&[text.to_string()], &self.embedding_model).await?;
        let query_vector = embeddings
            .first()
            .ok_or_else(|| ApiError::Internal("Embedder returned no vector".to_string()))?;

        let ordinals = index.search(query_vector, top_k)?;
        Ok(ordinals
            .into_iter()
            .filter_map(|ordinal| index.record(ordinal).cloned())
            .collect())
    }

    /// Grounding context for a query, optionally restricted to one zone.
    ///
    /// Retrieves `CONTEXT_TOP_K` hits, applies the zone post-filter, then
    /// joins the surviving record contents one per line in retrieval order.
    pub async fn context_for_query(
        &self,
        text: &str,
        zone: Option<&str>,
    ) -> Result<ContextOutcome, ApiError> {
        let mut hits = self.query(text, CONTEXT_TOP_K).await?;

        if let Some(zone) = zone {
            hits.retain(|record| record.zone.as_deref() == Some(zone));
        }

        if hits.is_empty() {
            return Ok(ContextOutcome::NotFound);
        }

        let context = hits
            .iter()
            .map(|record| record.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        Ok(ContextOutcome::Found(context))
    }
}
