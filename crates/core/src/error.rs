//! Error types for the RelayDesk domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each collaborator has its own error type so callers can decide which
//! failures are soft (resolved to "no contribution") and which are fatal.

use thiserror::Error;

/// Model-execution failure. Before the first chunk it fails the request;
/// mid-stream it ends the answer.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Failure to fetch or parse a knowledge/directives document.
///
/// Never surfaced to end users: the loader resolves every variant to
/// "absent". The variants exist so logs can tell a missing document from
/// an outage.
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Document source returned status {status} for {path}")]
    Status { path: String, status: u16 },

    #[error("I/O error reading {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Network error fetching {path}: {reason}")]
    Network { path: String, reason: String },

    #[error("Failed to parse {path}: {reason}")]
    Parse { path: String, reason: String },
}

impl LoadError {
    /// Whether this is an expected absence rather than a fault.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[derive(Debug, Clone, Error)]
pub enum RetrievalError {
    #[error("Retrieval method not supported: {0}")]
    Unsupported(&'static str),

    #[error("Retrieval request failed: {0}")]
    Request(String),

    #[error("Retrieval service returned status {0}")]
    Status(u16),

    #[error("Failed to parse retrieval response: {0}")]
    Parse(String),
}
