use std::sync::Arc;
use std::time::Duration;

use crate::error::LlmError;
use crate::provider::{EmbedFn, EmbedFuture, LlmProvider, Message};

const DEFAULT_BASE_BACKOFF: Duration = Duration::from_secs(1);

/// Exponential backoff for the given zero-based attempt: `base << attempt`.
pub(crate) fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX))
}

/// Wraps a provider and retries transient failures with exponential backoff.
///
/// Callers still see one logical request per `chat`/`embed` call; only errors for
/// which [`LlmError::is_transient`] holds are retried.
#[derive(Debug, Clone)]
pub struct RetryProvider<P> {
    inner: P,
    max_retries: u32,
    base_backoff: Duration,
}

impl<P: LlmProvider> RetryProvider<P> {
    #[must_use]
    pub fn new(inner: P, max_retries: u32) -> Self {
        Self {
            inner,
            max_retries,
            base_backoff: DEFAULT_BASE_BACKOFF,
        }
    }

    #[must_use]
    pub fn with_base_backoff(mut self, base: Duration) -> Self {
        self.base_backoff = base;
        self
    }

    #[must_use]
    pub fn inner(&self) -> &P {
        &self.inner
    }

    async fn wait_before_retry(&self, op: &str, attempt: u32, err: &LlmError) {
        let delay = backoff_delay(self.base_backoff, attempt);
        tracing::warn!(
            provider = self.inner.name(),
            op,
            attempt = attempt + 1,
            max_retries = self.max_retries,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "transient provider error, retrying: {err}"
        );
        tokio::time::sleep(delay).await;
    }
}

impl<P: LlmProvider + Clone + 'static> RetryProvider<P> {
    /// Embedding function for the semantic index; every call goes through the retry loop.
    #[must_use]
    pub fn embed_fn(&self) -> EmbedFn {
        let provider = Arc::new(self.clone());
        Box::new(move |text: &str| -> EmbedFuture {
            let p = Arc::clone(&provider);
            let owned = text.to_owned();
            Box::pin(async move { p.embed(&owned).await })
        })
    }
}

impl<P: LlmProvider> LlmProvider for RetryProvider<P> {
    async fn chat(&self, messages: &[Message]) -> Result<String, LlmError> {
        let mut attempt = 0;
        loop {
            match self.inner.chat(messages).await {
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    self.wait_before_retry("chat", attempt, &e).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let mut attempt = 0;
        loop {
            match self.inner.embed(text).await {
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    self.wait_before_retry("embed", attempt, &e).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    fn supports_embeddings(&self) -> bool {
        self.inner.supports_embeddings()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
