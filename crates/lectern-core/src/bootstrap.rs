//! Application wiring: provider, embedding function, index and composer from config.

use std::sync::Arc;

use anyhow::{Context, bail};
use lectern_llm::any::AnyProvider;
use lectern_llm::gemini::GeminiProvider;
use lectern_llm::hash::HashEmbedder;
use lectern_llm::ollama::OllamaProvider;
use lectern_llm::openai::OpenAiProvider;
use lectern_llm::retry::RetryProvider;
use lectern_llm::{EmbedFn, LlmError, LlmProvider, Message};
use lectern_memory::SemanticIndex;

use crate::composer::Composer;
use crate::config::{Config, DEFAULT_OLLAMA_EMBEDDING_MODEL, EmbeddingBackend, ProviderKind};

/// The generation provider as the application uses it: any backend behind retry.
pub type AppProvider = RetryProvider<AnyProvider>;

/// Construct the configured backend.
///
/// # Errors
///
/// Returns an error if the provider needs an API key that is not set.
pub fn create_provider(config: &Config) -> anyhow::Result<AnyProvider> {
    let llm = &config.llm;
    let base_url = llm.effective_base_url().to_owned();
    match llm.provider {
        ProviderKind::Ollama => Ok(AnyProvider::Ollama(OllamaProvider::new(
            &base_url,
            llm.model.clone(),
            llm.embedding_model
                .clone()
                .unwrap_or_else(|| DEFAULT_OLLAMA_EMBEDDING_MODEL.into()),
        ))),
        ProviderKind::OpenAi => Ok(AnyProvider::OpenAi(OpenAiProvider::new(
            api_key(config, ProviderKind::OpenAi)?,
            base_url,
            llm.model.clone(),
            llm.max_tokens,
            llm.embedding_model.clone(),
        ))),
        ProviderKind::Gemini => Ok(AnyProvider::Gemini(GeminiProvider::new(
            api_key(config, ProviderKind::Gemini)?,
            base_url,
            llm.model.clone(),
            llm.max_tokens,
            llm.embedding_model.clone(),
        ))),
    }
}

fn api_key(config: &Config, kind: ProviderKind) -> anyhow::Result<String> {
    let var = kind.api_key_env_var().unwrap_or("API key");
    Ok(config
        .secrets
        .api_key(kind)
        .with_context(|| format!("{var} is not set; export it to use the {kind} provider"))?
        .expose()
        .to_owned())
}

/// [`create_provider`] wrapped in [`RetryProvider`] with `llm.max_retries`.
///
/// # Errors
///
/// Returns an error if the provider cannot be constructed.
pub fn build_provider(config: &Config) -> anyhow::Result<AppProvider> {
    let provider = create_provider(config)?;
    tracing::info!(
        provider = %config.llm.provider,
        model = %config.llm.model,
        max_retries = config.llm.max_retries,
        "generation provider configured"
    );
    Ok(RetryProvider::new(provider, config.llm.max_retries))
}

/// Embedding function for the configured backend.
///
/// # Errors
///
/// Returns an error if the provider backend is selected but the provider has no
/// embedding model.
pub fn create_embed_fn(config: &Config, provider: &AppProvider) -> anyhow::Result<EmbedFn> {
    match config.embedding.backend {
        EmbeddingBackend::Hash => Ok(HashEmbedder::new(config.embedding.dimension).embed_fn()),
        EmbeddingBackend::Provider => {
            if !provider.supports_embeddings() {
                bail!(
                    "embedding.backend = \"provider\" requires llm.embedding_model for {}",
                    config.llm.provider
                );
            }
            Ok(provider.embed_fn())
        }
    }
}

/// # Errors
///
/// Returns an error if the embedding function cannot be created.
pub fn build_index(config: &Config, provider: &AppProvider) -> anyhow::Result<Arc<SemanticIndex>> {
    let embed_fn = create_embed_fn(config, provider)?;
    Ok(Arc::new(
        SemanticIndex::new(embed_fn).with_concurrency(config.embedding.concurrency),
    ))
}

#[must_use]
pub fn build_composer<P: LlmProvider>(
    config: &Config,
    index: Arc<SemanticIndex>,
    provider: P,
) -> Composer<P> {
    let composer = Composer::new(index, provider)
        .with_top_k(config.retrieval.top_k)
        .with_timeout(config.generation_timeout());
    match config.composer.seed {
        Some(seed) => composer.with_seed(seed),
        None => composer,
    }
}

pub async fn health_check(provider: &AnyProvider) {
    if let AnyProvider::Ollama(ollama) = provider {
        match ollama.health_check().await {
            Ok(()) => tracing::info!("ollama health check passed"),
            Err(e) => tracing::warn!("ollama health check failed: {e:#}"),
        }
    }
}

/// One short generation round trip to validate credentials and connectivity.
///
/// # Errors
///
/// Returns the provider error if the call fails.
pub async fn verify_provider<P: LlmProvider>(provider: &P) -> Result<String, LlmError> {
    let reply = provider
        .chat(&[Message::user("Reply with the single word: ready")])
        .await?;
    tracing::info!(provider = provider.name(), "provider verified");
    Ok(reply)
}
