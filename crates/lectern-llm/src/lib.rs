//! Generation and embedding providers.
//!
//! Every backend implements [`LlmProvider`]. [`retry::RetryProvider`] wraps any of
//! them with exponential backoff, and [`hash::HashEmbedder`] supplies an offline,
//! deterministic embedding function for indexing without a remote model.

pub mod any;
pub mod error;
pub mod gemini;
pub mod hash;
pub mod http;
#[cfg(feature = "mock")]
pub mod mock;
pub mod ollama;
pub mod openai;
pub mod provider;
pub mod retry;

pub use error::LlmError;
pub use provider::{EmbedFn, EmbedFuture, LlmProvider, Message, Role};
