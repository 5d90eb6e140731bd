//! Embedding index.
//!
//! Records and their embedding vectors live in one structure so the
//! positional coupling between the two collections cannot drift: the
//! constructor rejects any length or dimension mismatch, and neither side is
//! mutable afterwards.

use std::cmp::Ordering;

use ndarray::Array2;

use crate::core::errors::ApiError;
use crate::rag::record::Record;

/// Exact nearest-neighbour index over record embeddings.
///
/// Search is by squared Euclidean distance; ordinal position is the join key
/// between vectors and records.
pub struct EmbeddingIndex {
    records: Vec<Record>,
    vectors: Array2<f32>,
}

impl EmbeddingIndex {
    /// Build the index from records and their embeddings, in matching order.
    ///
    /// Fails fast on an empty corpus, on a record/vector count mismatch and
    /// on inconsistent embedding dimensions.
    pub fn build(records: Vec<Record>, embeddings: Vec<Vec<f32>>) -> Result<Self, ApiError> {
        if records.is_empty() {
            return Err(ApiError::BadRequest(
                "Cannot build an index over an empty corpus".to_string(),
            ));
        }
        if records.len() != embeddings.len() {
            return Err(ApiError::Internal(format!(
                "Record/embedding count mismatch: {} records, {} embeddings",
                records.len(),
                embeddings.len()
            )));
        }

        let dimension = embeddings[0].len();
        if dimension == 0 {
            return Err(ApiError::Internal(
                "Embedding dimension must be non-zero".to_string(),
            ));
        }

        let mut vectors = Array2::zeros((embeddings.len(), dimension));
        for (row, embedding) in embeddings.iter().enumerate() {
            if embedding.len() != dimension {
                return Err(ApiError::Internal(format!(
                    "Inconsistent embedding dimension at ordinal {}: expected {}, got {}",
                    row,
                    dimension,
                    embedding.len()
                )));
            }
            for (col, value) in embedding.iter().enumerate() {
                vectors[[row, col]] = *value;
            }
        }

        Ok(Self { records, vectors })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.vectors.ncols()
    }

    pub fn record(&self, ordinal: usize) -> Option<&Record> {
        self.records.get(ordinal)
    }

    /// Ordinals of the `k` records nearest to `query`, ascending by squared
    /// Euclidean distance, ties broken by original ordinal. Returns fewer
    /// than `k` when the corpus is smaller.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<usize>, ApiError> {
        if query.len() != self.dimension() {
            return Err(ApiError::BadRequest(format!(
                "Query dimension mismatch: expected {}, got {}",
                self.dimension(),
                query.len()
            )));
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .rows()
            .into_iter()
            .enumerate()
            .map(|(ordinal, row)| {
                let distance: f32 = row
                    .iter()
                    .zip(query.iter())
                    .map(|(a, b)| (a - b) * (a - b))
                    .sum();
                (ordinal, distance)
            })
            .collect();

        // sort_by is stable, so equal distances keep ordinal order.
        scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
        scored.truncate(k);

        Ok(scored.into_iter().map(|(ordinal, _)| ordinal).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::record::RecordKind;

    fn record(content: &str) -> Record {
        Record {
            content: content.to_string(),
            zone: None,
            kind: RecordKind::ZoneInfo,
            variable: None,
            column: None,
        }
    }

    #[test]
    fn build_rejects_empty_corpus() {
        let result = EmbeddingIndex::build(vec![], vec![]);
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn build_rejects_length_mismatch() {
        let result = EmbeddingIndex::build(vec![record("a")], vec![]);
        assert!(matches!(result, Err(ApiError::Internal(_))));
    }

    #[test]
    fn build_rejects_ragged_embeddings() {
        let result = EmbeddingIndex::build(
            vec![record("a"), record("b")],
            vec![vec![1.0, 0.0], vec![1.0]],
        );
        assert!(matches!(result, Err(ApiError::Internal(_))));
    }

    #[test]
    fn search_returns_nearest_first() {
        let index = EmbeddingIndex::build(
            vec![record("a"), record("b"), record("c")],
            vec![vec![0.0, 1.0], vec![1.0, 0.0], vec![0.9, 0.1]],
        )
        .expect("index should build");

        let hits = index.search(&[1.0, 0.0], 2).expect("search should work");
        assert_eq!(hits, vec![1, 2]);
    }

    #[test]
    fn exact_match_is_top_hit() {
        let index = EmbeddingIndex::build(
            vec![record("a"), record("b"), record("c")],
            vec![vec![0.2, 0.8], vec![0.5, 0.5], vec![0.8, 0.2]],
        )
        .expect("index should build");

        for (ordinal, embedding) in [[0.2f32, 0.8], [0.5, 0.5], [0.8, 0.2]].iter().enumerate() {
            let hits = index.search(embedding, 1).expect("search should work");
            assert_eq!(hits, vec![ordinal]);
        }
    }

    #[test]
    fn ties_break_by_ordinal() {
        let index = EmbeddingIndex::build(
            vec![record("a"), record("b"), record("c")],
            vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0]],
        )
        .expect("index should build");

        let hits = index.search(&[1.0, 0.0], 3).expect("search should work");
        assert_eq!(hits, vec![0, 2, 1]);
    }

    #[test]
    fn search_returns_fewer_than_k_for_small_corpus() {
        let index = EmbeddingIndex::build(vec![record("a")], vec![vec![1.0]])
            .expect("index should build");

        let hits = index.search(&[0.5], 5).expect("search should work");
        assert_eq!(hits, vec![0]);
    }

    #[test]
    fn search_rejects_wrong_query_dimension() {
        let index = EmbeddingIndex::build(vec![record("a")], vec![vec![1.0, 0.0]])
            .expect("index should build");

        assert!(index.search(&[1.0], 1).is_err());
    }
}
