//! Interactive chat state: the loaded document's identity plus the composer.

use std::path::Path;

use anyhow::Context;
use lectern_core::composer::{Composer, FormattedAnswer};
use lectern_core::ingest::{self, IngestReport, Ingestor};
use lectern_llm::LlmProvider;

/// One line of chat input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatCommand<'a> {
    Ask(&'a str),
    Load(&'a str),
    Reset,
    Stats,
    Help,
    Exit,
    Empty,
    Unknown(&'a str),
}

#[must_use]
pub fn parse_command(line: &str) -> ChatCommand<'_> {
    let line = line.trim();
    if line.is_empty() {
        return ChatCommand::Empty;
    }
    if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
        return ChatCommand::Exit;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return ChatCommand::Ask(line);
    };
    let (cmd, arg) = rest
        .split_once(char::is_whitespace)
        .map_or((rest, ""), |(c, a)| (c, a.trim()));
    match cmd {
        "load" if !arg.is_empty() => ChatCommand::Load(arg),
        "reset" => ChatCommand::Reset,
        "stats" => ChatCommand::Stats,
        "help" => ChatCommand::Help,
        "exit" | "quit" => ChatCommand::Exit,
        _ => ChatCommand::Unknown(line),
    }
}

pub const HELP: &str = "\
commands:
  /load <path>  load a document (skipped when unchanged)
  /reset        forget the current document
  /stats        show page and chunk counts
  /help         show this help
  exit, quit    leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Ingested(IngestReport),
    Unchanged(IngestReport),
}

pub struct Session<P> {
    composer: Composer<P>,
    ingestor: Ingestor,
    current: Option<IngestReport>,
}

impl<P: LlmProvider> Session<P> {
    #[must_use]
    pub fn new(composer: Composer<P>, ingestor: Ingestor) -> Self {
        Self {
            composer,
            ingestor,
            current: None,
        }
    }

    /// Ingest `bytes` unless they match the loaded document's fingerprint.
    ///
    /// # Errors
    ///
    /// Returns an error if ingestion fails; the previous document stays loaded.
    pub async fn load_bytes(&mut self, bytes: &[u8]) -> anyhow::Result<LoadOutcome> {
        if let Some(current) = &self.current
            && current.fingerprint == ingest::fingerprint(bytes)
        {
            tracing::debug!(fingerprint = %current.fingerprint, "document unchanged, skipping ingestion");
            return Ok(LoadOutcome::Unchanged(current.clone()));
        }
        let report = self
            .ingestor
            .ingest(self.composer.index(), bytes)
            .await
            .context("failed to ingest document")?;
        self.current = Some(report.clone());
        Ok(LoadOutcome::Ingested(report))
    }

    /// # Errors
    ///
    /// Returns an error if the file is rejected by the loader's extension or size
    /// checks, cannot be read, or fails to ingest.
    pub async fn load_path(&mut self, path: &Path) -> anyhow::Result<LoadOutcome> {
        let bytes = self
            .ingestor
            .loader()
            .read_path(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        self.load_bytes(&bytes).await
    }

    /// # Errors
    ///
    /// Returns an error if the index lock is poisoned.
    pub fn reset(&mut self) -> anyhow::Result<()> {
        self.composer.index().clear()?;
        self.current = None;
        Ok(())
    }

    #[must_use]
    pub fn current(&self) -> Option<&IngestReport> {
        self.current.as_ref()
    }

    pub async fn ask(&self, query: &str) -> FormattedAnswer {
        self.composer.answer(query).await
    }

    #[must_use]
    pub fn stats(&self) -> String {
        match self.current() {
            Some(report) => format!(
                "{} pages, {} chunks indexed (fingerprint {})",
                report.pages,
                self.composer.index().chunk_count(),
                &report.fingerprint[..12]
            ),
            None => "no document loaded".into(),
        }
    }
}
