//! Upstream completion errors.

use thiserror::Error;

/// Errors from the upstream completion API.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Upstream answered with a non-2xx status.
    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The request never completed (connect, DNS, timeout).
    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// No credential configured for the upstream call.
    #[error("no upstream API key configured")]
    MissingCredential,
}

/// Result type for upstream operations.
pub type UpstreamResult<T> = Result<T, UpstreamError>;
