//! Error types for Trendlens.

use thiserror::Error;

/// Library-level error type for Trendlens operations.
#[derive(Error, Debug)]
pub enum TrendlensError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Video platform error: {0}")]
    Platform(String),

    #[error("Video platform rejected the request: {0}")]
    PlatformRejected(String),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Completion error: {0}")]
    Completion(String),

    #[error("Question '{question}' failed on chunk {chunk} of {chunks}: {source}")]
    ChunkFailed {
        question: String,
        chunk: usize,
        chunks: usize,
        #[source]
        source: Box<TrendlensError>,
    },

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl TrendlensError {
    /// Whether the failure is an upstream outage worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TrendlensError::Platform(_) | TrendlensError::OpenAI(_) | TrendlensError::Http(_)
        )
    }
}

/// Result type alias for Trendlens operations.
pub type Result<T> = std::result::Result<T, TrendlensError>;
