//! Error taxonomy for the docbench pipeline.
//!
//! Only [`PipelineError`] (and the [`IngestError`] it wraps) ever reaches a caller as a
//! failure of the whole request. [`GenerationError`] is recorded per task inside a
//! `DocumentationResult`, and [`RemoteError`] is folded into ingestion warnings or,
//! when nothing could be collected, into an [`IngestError`].

use std::time::Duration;
use thiserror::Error;

/// Fatal ingestion outcomes.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("No supported source files found in the project")]
    NoSupportedFiles,

    #[error("Invalid repository URL: {0}")]
    InvalidRepositoryUrl(String),

    #[error("Archive is empty or unreadable: {0}")]
    EmptyArchive(String),

    #[error("{0}")]
    RateLimited(String),

    #[error("Failed to fetch repository: {0}")]
    Remote(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IngestError {
    /// Surfaces a remote rate-limit verbatim so the caller can advise adding credentials.
    pub fn from_remote_rate_limit(err: RemoteError) -> Self {
        IngestError::RateLimited(err.to_string())
    }
}

/// Failure of a single generation call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("Request timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl GenerationError {
    pub fn timeout(after: Duration) -> Self {
        GenerationError::Timeout {
            after_ms: after.as_millis() as u64,
        }
    }

    /// Transient failures worth another attempt. A missing model is terminal.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GenerationError::Timeout { .. }
                | GenerationError::RateLimited(_)
                | GenerationError::ServiceUnavailable(_)
                | GenerationError::Network(_)
        )
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, GenerationError::Timeout { .. })
    }
}

/// Failure of a remote repository listing or download.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    #[error("GitHub API rate limit exceeded. Try again later or add a GITHUB_TOKEN environment variable. ({0})")]
    RateLimited(String),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Could not decode response: {0}")]
    Decode(String),
}

/// Errors that abort a whole comparison request.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error("No API keys configured for any providers")]
    NoProvidersAvailable,

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),
}
