//! Classifier → retrieval → generation → citations.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use lectern_llm::{LlmError, LlmProvider};
use lectern_memory::{RetrievalResult, SemanticIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::classifier::{self, DeflectReason, Verdict};
use crate::prompt;

pub const DEFAULT_TOP_K: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Citation {
    pub section: String,
    pub page: u32,
    pub preview: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormattedAnswer {
    pub text: String,
    pub verdict: Verdict,
    pub citations: Vec<Citation>,
    /// Whether any document passage was supplied to the generator.
    pub grounded: bool,
}

#[derive(Debug, thiserror::Error)]
enum GenerationError {
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error("generation timed out after {}s", .0.as_secs())]
    Timeout(Duration),
}

pub struct Composer<P> {
    index: Arc<SemanticIndex>,
    provider: P,
    top_k: usize,
    timeout: Option<Duration>,
    rng: Mutex<StdRng>,
}

impl<P> std::fmt::Debug for Composer<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Composer")
            .field("top_k", &self.top_k)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl<P: LlmProvider> Composer<P> {
    #[must_use]
    pub fn new(index: Arc<SemanticIndex>, provider: P) -> Self {
        Self {
            index,
            provider,
            top_k: DEFAULT_TOP_K,
            timeout: None,
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Make deflection choice reproducible.
    #[must_use]
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ..self
        }
    }

    /// Number of passages retrieved per answer. Clamped to at least 1.
    #[must_use]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn index(&self) -> &Arc<SemanticIndex> {
        &self.index
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Answer `query`. Never fails: deflections, search errors and generation
    /// errors all end in a displayable answer.
    pub async fn answer(&self, query: &str) -> FormattedAnswer {
        let verdict = classifier::classify(query);
        if let Verdict::Deflect(reason) = verdict {
            return self.deflect(reason);
        }

        let results = match self.index.search(query, self.top_k).await {
            Ok(results) => results,
            Err(e) => {
                tracing::warn!("document search failed, answering without grounding: {e}");
                Vec::new()
            }
        };
        let grounded = !results.is_empty();
        let messages = prompt::build_messages(query, &results);

        let text = match self.generate(&messages).await {
            Ok(reply) => {
                let mut text = reply;
                if let Some(footer) = prompt::citation_footer(&results) {
                    text.push_str(&footer);
                }
                text
            }
            Err(e) => {
                tracing::error!(provider = self.provider.name(), "generation failed: {e}");
                return FormattedAnswer {
                    text: prompt::apology(&e.to_string()),
                    verdict,
                    citations: Vec::new(),
                    grounded,
                };
            }
        };

        FormattedAnswer {
            text,
            verdict,
            citations: citations(&results),
            grounded,
        }
    }

    fn deflect(&self, reason: DeflectReason) -> FormattedAnswer {
        let pick = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            rng.random_range(0..prompt::DEFLECTIONS.len())
        };
        tracing::info!(%reason, "query deflected");
        FormattedAnswer {
            text: prompt::DEFLECTIONS[pick].to_owned(),
            verdict: Verdict::Deflect(reason),
            citations: Vec::new(),
            grounded: false,
        }
    }

    async fn generate(&self, messages: &[lectern_llm::Message]) -> Result<String, GenerationError> {
        let call = self.provider.chat(messages);
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| GenerationError::Timeout(limit))?
                .map_err(GenerationError::from),
            None => Ok(call.await?),
        }
    }
}

fn citations(results: &[RetrievalResult]) -> Vec<Citation> {
    results
        .iter()
        .map(|r| Citation {
            section: r.section_title.clone(),
            page: r.page,
            preview: prompt::preview(&r.chunk_text),
        })
        .collect()
}
