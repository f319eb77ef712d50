#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("embedding failed: {0}")]
    Embedding(#[from] lectern_llm::LlmError),

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("embedding function returned an empty vector")]
    EmptyEmbedding,

    #[error("search limit must be a positive integer")]
    InvalidLimit,

    #[error("index lock poisoned: {0}")]
    Lock(String),
}
