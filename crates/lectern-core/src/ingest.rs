//! One-call document ingestion: load → split → build.

use std::path::Path;

use lectern_memory::IndexError;
use lectern_memory::SemanticIndex;
use lectern_memory::document::{DocumentError, Loader, SplitterError, TextSplitter};
use serde::Serialize;

use crate::config::Config;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to read document: {0}")]
    Document(#[from] DocumentError),

    #[error("failed to index document: {0}")]
    Index(#[from] IndexError),

    #[error("invalid chunking configuration: {0}")]
    Splitter(#[from] SplitterError),
}

/// Outcome of a successful ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub pages: usize,
    pub chunks: usize,
    /// BLAKE3 hex digest of the document bytes.
    pub fingerprint: String,
}

impl std::fmt::Display for IngestReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "processed {} chunks from {} pages", self.chunks, self.pages)
    }
}

/// BLAKE3 hex digest identifying a document's content.
#[must_use]
pub fn fingerprint(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

#[derive(Debug, Clone, Copy)]
pub struct Ingestor {
    loader: Loader,
    splitter: TextSplitter,
}

impl Ingestor {
    #[must_use]
    pub fn new(loader: Loader, splitter: TextSplitter) -> Self {
        Self { loader, splitter }
    }

    /// # Errors
    ///
    /// Returns an error if the chunking settings are invalid.
    pub fn from_config(config: &Config) -> Result<Self, IngestError> {
        Ok(Self::new(
            Loader::new(config.document.max_file_size),
            TextSplitter::new(config.splitter_config())?,
        ))
    }

    #[must_use]
    pub fn loader(&self) -> Loader {
        self.loader
    }

    #[must_use]
    pub fn splitter(&self) -> TextSplitter {
        self.splitter
    }

    /// Replace the index contents with `bytes`. The index is untouched on error.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be loaded or embedded.
    pub async fn ingest(
        &self,
        index: &SemanticIndex,
        bytes: &[u8],
    ) -> Result<IngestReport, IngestError> {
        let fingerprint = fingerprint(bytes);
        let loader = self.loader;
        let owned = bytes.to_vec();
        let pages = tokio::task::spawn_blocking(move || loader.load(&owned))
            .await
            .map_err(|e| DocumentError::Io(std::io::Error::other(e)))??;

        let chunks = self.splitter.split_pages(&pages);
        let report = IngestReport {
            pages: pages.len(),
            chunks: chunks.len(),
            fingerprint,
        };
        index.build(&pages, chunks).await?;

        tracing::info!(
            pages = report.pages,
            chunks = report.chunks,
            fingerprint = %report.fingerprint,
            "document ingested"
        );
        Ok(report)
    }

    /// # Errors
    ///
    /// Returns an error if the file cannot be read or [`ingest`](Self::ingest) fails.
    pub async fn ingest_path(
        &self,
        index: &SemanticIndex,
        path: &Path,
    ) -> Result<IngestReport, IngestError> {
        let bytes = self.loader.read_path(path).await?;
        self.ingest(index, &bytes).await
    }
}
