mod env;
mod types;

#[cfg(test)]
mod tests;

pub use types::*;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use lectern_memory::document::SplitterConfig;

use crate::secret::Secret;

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        config.resolve_secrets();
        Ok(config)
    }

    /// Pick up API keys from `LECTERN_OPENAI_API_KEY` and `LECTERN_GEMINI_API_KEY`.
    pub fn resolve_secrets(&mut self) {
        if let Some(key) = Secret::from_env("LECTERN_OPENAI_API_KEY") {
            self.secrets.openai_api_key = Some(key);
        }
        if let Some(key) = Secret::from_env("LECTERN_GEMINI_API_KEY") {
            self.secrets.gemini_api_key = Some(key);
        }
    }

    /// Reject settings no component can run with.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid setting.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.chunking.chunk_size == 0 {
            bail!("chunking.chunk_size must be greater than 0");
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            bail!(
                "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
                self.chunking.chunk_overlap,
                self.chunking.chunk_size
            );
        }
        if self.retrieval.top_k == 0 {
            bail!("retrieval.top_k must be at least 1");
        }
        if self.embedding.dimension == 0 {
            bail!("embedding.dimension must be greater than 0");
        }
        if self.embedding.concurrency == 0 {
            bail!("embedding.concurrency must be at least 1");
        }
        if self.llm.max_tokens == 0 {
            bail!("llm.max_tokens must be greater than 0");
        }
        if self.llm.model.trim().is_empty() {
            bail!("llm.model must not be empty");
        }
        if self.document.max_file_size == 0 {
            bail!("document.max_file_size must be greater than 0");
        }
        Ok(())
    }

    #[must_use]
    pub fn splitter_config(&self) -> SplitterConfig {
        SplitterConfig {
            chunk_size: self.chunking.chunk_size,
            chunk_overlap: self.chunking.chunk_overlap,
        }
    }

    #[must_use]
    pub fn generation_timeout(&self) -> Option<Duration> {
        (self.composer.timeout_secs > 0).then(|| Duration::from_secs(self.composer.timeout_secs))
    }
}

/// `--config <path>`, then `LECTERN_CONFIG`, then `config/default.toml`.
#[must_use]
pub fn resolve_config_path(cli_path: Option<&Path>) -> PathBuf {
    if let Some(path) = cli_path {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var("LECTERN_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from("config/default.toml")
}
