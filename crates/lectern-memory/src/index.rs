//! In-memory semantic index over document chunks.
//!
//! State is an immutable [`IndexState`] snapshot behind an `Arc`. A build computes
//! the whole replacement outside the lock and swaps it in, so a concurrent
//! [`SemanticIndex::search`] sees either the old snapshot or the new one.

use std::sync::{Arc, RwLock};

use futures::{StreamExt, TryStreamExt, stream};
use lectern_llm::{EmbedFn, EmbedFuture};
use serde::Serialize;

use crate::document::{Chunk, PageRecord, full_text};
use crate::error::IndexError;

/// Default number of chunk embeddings in flight during a build.
pub const DEFAULT_CONCURRENCY: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct IndexedChunk {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

/// Everything the index knows about one document.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexState {
    pub entries: Vec<IndexedChunk>,
    /// Every page behind a `--- Page N ---` marker.
    pub full_text: String,
    pub dimension: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalResult {
    pub chunk_text: String,
    pub page: u32,
    pub section_title: String,
    /// 1-based position in the result list.
    pub rank: usize,
    pub score: f32,
    pub chunk_id: usize,
}

pub struct SemanticIndex {
    embed_fn: EmbedFn,
    state: RwLock<Option<Arc<IndexState>>>,
    build_lock: tokio::sync::Mutex<()>,
    concurrency: usize,
}

impl std::fmt::Debug for SemanticIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticIndex")
            .field("concurrency", &self.concurrency)
            .field("chunks", &self.chunk_count())
            .finish_non_exhaustive()
    }
}

impl SemanticIndex {
    #[must_use]
    pub fn new(embed_fn: EmbedFn) -> Self {
        Self {
            embed_fn,
            state: RwLock::new(None),
            build_lock: tokio::sync::Mutex::new(()),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Bound on concurrent embedding calls during [`build`](Self::build). Clamped to at least 1.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Embed every chunk and replace the current state.
    ///
    /// Builds are serialized. On error the previous state is left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if any embedding fails, is empty, or disagrees in dimension
    /// with the others.
    pub async fn build(&self, pages: &[PageRecord], chunks: Vec<Chunk>) -> Result<(), IndexError> {
        let _guard = self.build_lock.lock().await;

        let pending: Vec<EmbedFuture> = chunks
            .iter()
            .map(|chunk| {
                tracing::debug!(chunk_id = chunk.id, page = chunk.source_page, "embedding chunk");
                (self.embed_fn)(&chunk.text)
            })
            .collect();
        let vectors: Vec<Vec<f32>> = stream::iter(pending)
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        let dimension = validate_dimension(&vectors)?;
        let entries: Vec<IndexedChunk> = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| IndexedChunk { chunk, vector })
            .collect();

        let state = IndexState {
            entries,
            full_text: full_text(pages),
            dimension,
        };
        let count = state.entries.len();

        *self
            .state
            .write()
            .map_err(|e| IndexError::Lock(e.to_string()))? = Some(Arc::new(state));

        tracing::info!(chunks = count, dimension, "semantic index built");
        Ok(())
    }

    /// Return up to `k` chunks most similar to `query`, best first, ties by ascending id.
    ///
    /// An unbuilt or empty index yields no results without calling the embedder.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::InvalidLimit`] for `k == 0`, or an error if the query
    /// cannot be embedded.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<RetrievalResult>, IndexError> {
        if k == 0 {
            return Err(IndexError::InvalidLimit);
        }
        let Some(state) = self.snapshot()? else {
            return Ok(Vec::new());
        };
        if state.entries.is_empty() {
            return Ok(Vec::new());
        }

        let query_vec = (self.embed_fn)(query).await?;
        if query_vec.len() != state.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: state.dimension,
                actual: query_vec.len(),
            });
        }

        let mut scored: Vec<(f32, &IndexedChunk)> = state
            .entries
            .iter()
            .map(|entry| (cosine_similarity(&query_vec, &entry.vector), entry))
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.chunk.id.cmp(&b.1.chunk.id)));
        scored.truncate(k);

        let results: Vec<RetrievalResult> = scored
            .into_iter()
            .zip(1..)
            .map(|((score, entry), rank)| RetrievalResult {
                chunk_text: entry.chunk.text.clone(),
                page: entry.chunk.source_page,
                section_title: entry.chunk.section_title.clone(),
                rank,
                score,
                chunk_id: entry.chunk.id,
            })
            .collect();

        tracing::debug!(k, returned = results.len(), "semantic search");
        Ok(results)
    }

    /// Drop the current document.
    ///
    /// # Errors
    ///
    /// Returns an error if the state lock is poisoned.
    pub fn clear(&self) -> Result<(), IndexError> {
        *self
            .state
            .write()
            .map_err(|e| IndexError::Lock(e.to_string()))? = None;
        tracing::info!("semantic index cleared");
        Ok(())
    }

    /// Current state, if built.
    ///
    /// # Errors
    ///
    /// Returns an error if the state lock is poisoned.
    pub fn snapshot(&self) -> Result<Option<Arc<IndexState>>, IndexError> {
        self.state
            .read()
            .map(|guard| guard.clone())
            .map_err(|e| IndexError::Lock(e.to_string()))
    }

    #[must_use]
    pub fn is_built(&self) -> bool {
        matches!(self.snapshot(), Ok(Some(_)))
    }

    #[must_use]
    pub fn chunk_count(&self) -> usize {
        match self.snapshot() {
            Ok(Some(state)) => state.entries.len(),
            _ => 0,
        }
    }

    #[must_use]
    pub fn full_text(&self) -> Option<String> {
        match self.snapshot() {
            Ok(Some(state)) => Some(state.full_text.clone()),
            _ => None,
        }
    }

    #[must_use]
    pub fn chunks(&self) -> Vec<Chunk> {
        match self.snapshot() {
            Ok(Some(state)) => state.entries.iter().map(|e| e.chunk.clone()).collect(),
            _ => Vec::new(),
        }
    }
}

fn validate_dimension(vectors: &[Vec<f32>]) -> Result<usize, IndexError> {
    let Some(first) = vectors.first() else {
        return Ok(0);
    };
    let expected = first.len();
    if expected == 0 {
        return Err(IndexError::EmptyEmbedding);
    }
    if let Some(bad) = vectors.iter().find(|v| v.len() != expected) {
        return Err(IndexError::DimensionMismatch {
            expected,
            actual: bad.len(),
        });
    }
    Ok(expected)
}

/// Cosine similarity; 0.0 when either vector has zero norm.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
