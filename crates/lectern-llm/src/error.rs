#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("rate limited")]
    RateLimited,

    #[error("provider unavailable")]
    Unavailable,

    #[error("{provider} rejected the request (status {status})")]
    Status { provider: String, status: u16 },

    #[error("empty response from {provider}")]
    EmptyResponse { provider: String },

    #[error("embedding not supported by {provider}")]
    EmbedUnsupported { provider: String },

    #[error("{0}")]
    Other(String),
}

impl LlmError {
    /// Whether retrying the same request can reasonably succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited | Self::Unavailable => true,
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_and_unavailable_are_transient() {
        assert!(LlmError::RateLimited.is_transient());
        assert!(LlmError::Unavailable.is_transient());
    }

    #[test]
    fn server_errors_are_transient_client_errors_are_not() {
        let server = LlmError::Status {
            provider: "openai".into(),
            status: 503,
        };
        let client = LlmError::Status {
            provider: "openai".into(),
            status: 401,
        };
        assert!(server.is_transient());
        assert!(!client.is_transient());
    }

    #[test]
    fn other_is_not_transient() {
        assert!(!LlmError::Other("boom".into()).is_transient());
        assert!(
            !LlmError::EmbedUnsupported {
                provider: "gemini".into()
            }
            .is_transient()
        );
    }

    #[test]
    fn display_includes_provider() {
        let e = LlmError::EmptyResponse {
            provider: "gemini".into(),
        };
        assert_eq!(e.to_string(), "empty response from gemini");
    }
}
