//! Error types for statgraph
//!
//! Defines a comprehensive error enum covering all failure modes across the system.
//! Uses thiserror for ergonomic error handling.

use thiserror::Error;

/// Result type alias for statgraph operations
pub type Result<T> = std::result::Result<T, StatGraphError>;

/// Comprehensive error type for statgraph operations
#[derive(Error, Debug)]
pub enum StatGraphError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The upstream statistics API could not be reached or returned a
    /// non-success status. Never retried by the adapter; retry policy
    /// belongs to the caller.
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    /// The upstream payload was missing an expected field or array, or a
    /// field had an unusable type
    #[error("Malformed upstream data: {0}")]
    MalformedUpstream(String),

    /// A sub-resource lookup was attempted for a state id the catalog does
    /// not contain. Catalog-derived ids never hit this; it indicates a
    /// caller bug rather than a transient condition.
    #[error("Unknown state: {0}")]
    UnknownState(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),

    /// Anyhow errors (for more context)
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

// Every transport failure (connect, timeout, body decode) folds into the
// source-unavailable bucket; the adapter does not distinguish them.
impl From<reqwest::Error> for StatGraphError {
    fn from(err: reqwest::Error) -> Self {
        StatGraphError::SourceUnavailable(err.to_string())
    }
}

impl StatGraphError {
    /// True for failures the transport layer should render as a generic
    /// "try again" response rather than a caller error.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            StatGraphError::SourceUnavailable(_) | StatGraphError::MalformedUpstream(_)
        )
    }
}
