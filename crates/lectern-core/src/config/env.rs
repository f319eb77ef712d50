use std::str::FromStr;

use super::Config;

/// Parse `key` from the environment, warning on and ignoring unparsable values.
fn parse_env<T: FromStr>(key: &str) -> Option<T> {
    let v = std::env::var(key).ok()?;
    match v.trim().parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!("ignoring invalid {key} value: {v}");
            None
        }
    }
}

/// Parse a lowercase serde enum (`"openai"`, `"hash"`, ...) from the environment.
fn parse_env_enum<T: serde::de::DeserializeOwned>(key: &str) -> Option<T> {
    let v = std::env::var(key).ok()?;
    if let Ok(kind) = serde_json::from_value(serde_json::Value::String(v.trim().to_lowercase())) {
        Some(kind)
    } else {
        tracing::warn!("ignoring invalid {key} value: {v}");
        None
    }
}

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_llm();
        self.apply_env_overrides_pipeline();
    }

    fn apply_env_overrides_llm(&mut self) {
        if let Some(kind) = parse_env_enum("LECTERN_LLM_PROVIDER") {
            self.llm.provider = kind;
        }
        if let Ok(v) = std::env::var("LECTERN_LLM_BASE_URL") {
            self.llm.base_url = Some(v);
        }
        if let Ok(v) = std::env::var("LECTERN_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("LECTERN_LLM_EMBEDDING_MODEL") {
            self.llm.embedding_model = Some(v);
        }
        if let Some(n) = parse_env("LECTERN_LLM_MAX_TOKENS") {
            self.llm.max_tokens = n;
        }
        if let Some(n) = parse_env("LECTERN_LLM_MAX_RETRIES") {
            self.llm.max_retries = n;
        }
    }

    fn apply_env_overrides_pipeline(&mut self) {
        if let Some(backend) = parse_env_enum("LECTERN_EMBEDDING_BACKEND") {
            self.embedding.backend = backend;
        }
        if let Some(n) = parse_env("LECTERN_EMBEDDING_DIMENSION") {
            self.embedding.dimension = n;
        }
        if let Some(n) = parse_env("LECTERN_EMBEDDING_CONCURRENCY") {
            self.embedding.concurrency = n;
        }
        if let Some(n) = parse_env("LECTERN_CHUNK_SIZE") {
            self.chunking.chunk_size = n;
        }
        if let Some(n) = parse_env("LECTERN_CHUNK_OVERLAP") {
            self.chunking.chunk_overlap = n;
        }
        if let Some(n) = parse_env("LECTERN_RETRIEVAL_TOP_K") {
            self.retrieval.top_k = n;
        }
        if let Some(seed) = parse_env("LECTERN_COMPOSER_SEED") {
            self.composer.seed = Some(seed);
        }
        if let Some(secs) = parse_env("LECTERN_COMPOSER_TIMEOUT") {
            self.composer.timeout_secs = secs;
        }
        if let Some(bytes) = parse_env("LECTERN_DOCUMENT_MAX_FILE_SIZE") {
            self.document.max_file_size = bytes;
        }
    }
}
