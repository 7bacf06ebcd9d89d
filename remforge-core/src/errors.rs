use thiserror::Error;

/// Failures from the text-generation capability or from parsing its output.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GenError {
    /// Provider construction problem (missing credentials, bad settings).
    /// The one fatal class, surfaced before any generation work starts.
    #[error("provider configuration: {0}")]
    Config(String),
    #[error("generation request failed: {0}")]
    Request(String),
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("prompt too large: {0}")]
    TokenLimit(String),
    #[error("response did not contain the expected {0}")]
    Parse(&'static str),
}

impl GenError {
    /// Transient failures are retried with backoff; the rest fail fast.
    pub fn is_transient(&self) -> bool {
        matches!(self, GenError::Request(_) | GenError::RateLimited(_))
    }
}

/// Failures while loading or validating topic content, raised before any
/// generation begins.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ContentError {
    #[error("invalid content at {path}: {reason}")]
    InvalidTopic { path: String, reason: String },
    #[error("malformed content file: {0}")]
    Parse(String),
    #[error("content file error: {0}")]
    Io(String),
}
