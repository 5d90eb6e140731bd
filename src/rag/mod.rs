//! Knowledge retrieval module.
//!
//! This module provides:
//! - `build_corpus`: turns zone metadata and summary statistics into records
//! - `EmbeddingIndex`: exact nearest-neighbour search over record embeddings
//! - `RetrievalEngine`: query embedding, lazy index build and context assembly

mod corpus;
mod engine;
mod index;
mod record;

pub use corpus::build_corpus;
pub use engine::{ContextOutcome, RetrievalEngine};
pub use index::EmbeddingIndex;
pub use record::{Record, RecordKind};
