use std::time::Duration;

use thiserror::Error;

/// Substrings (lowercase) that mark a provider or network failure as transient.
const TRANSIENT_PATTERNS: &[&str] = &[
    "rate limit",
    "rate_limit",
    "ratelimit",
    "too many requests",
    "resource exhausted",
    "resource_exhausted",
    "quota",
    "internal error",
    "internal server error",
    "unavailable",
    "overloaded",
    "timeout",
    "timed out",
    "deadline exceeded",
    "connection reset",
    "econnreset",
    "try again",
];

/// HTTP statuses that mark a failure as transient. Matched as whole tokens
/// so "1500 tokens" is not read as a 500.
const TRANSIENT_STATUS_CODES: &[&str] = &["429", "500", "502", "503", "504"];

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    /// The provider rejected or failed the request (message as reported).
    #[error("{0}")]
    Provider(String),

    /// The request never got a provider answer (transport failure).
    #[error("network error: {0}")]
    Network(String),

    /// The provider's own operation did not finish within the poll budget.
    #[error("generation timed out: operation still running after {attempts} status checks")]
    PollTimeout { attempts: u32 },

    /// The wall-clock ceiling for the call elapsed first.
    #[error("generation timed out: no result within {}s", .0.as_secs())]
    DeadlineExceeded(Duration),

    /// The provider reported success but returned no bytes.
    #[error("provider returned empty media")]
    EmptyMedia,

    #[error("generation cancelled")]
    Cancelled,
}

impl GenerationError {
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Whether one more attempt is worth making.
    ///
    /// Only provider/network messages are classified. Our own timeouts are
    /// terminal for the phase even though their message says "timed out".
    pub fn is_retryable(&self) -> bool {
        match self {
            GenerationError::Provider(msg) | GenerationError::Network(msg) => {
                let msg = msg.to_lowercase();
                TRANSIENT_PATTERNS.iter().any(|p| msg.contains(p))
                    || msg
                        .split(|c: char| !c.is_ascii_alphanumeric())
                        .any(|token| TRANSIENT_STATUS_CODES.contains(&token))
            }
            GenerationError::PollTimeout { .. }
            | GenerationError::DeadlineExceeded(_)
            | GenerationError::EmptyMedia
            | GenerationError::Cancelled => false,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            GenerationError::PollTimeout { .. } | GenerationError::DeadlineExceeded(_)
        )
    }
}
