//! Error types for searchfeed-client

use thiserror::Error;

/// Errors from index utility calls and document construction.
///
/// Batch submission itself reports through
/// [`EndpointError`](searchfeed_core::EndpointError) so the uploader
/// can apply its retry policy uniformly.
#[derive(Error, Debug)]
pub enum ClientError {
    /// HTTP request failed
    #[error("request failed: {0}")]
    Http(String),

    /// Credentials were rejected
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Index does not exist
    #[error("index not found: {0}")]
    NotFound(String),

    /// Response could not be interpreted
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Document is not representable on the wire
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// Document is missing its key field
    #[error("document is missing key field '{field}'")]
    MissingKeyField { field: String },

    /// API key environment variable not set
    #[error("environment variable '{0}' not set")]
    MissingEnvVar(String),

    /// Request timed out
    #[error("request timed out")]
    Timeout,

    /// Document count did not reach the expected total in time
    #[error("document count stalled at {last} of {expected}")]
    CountTimeout { expected: u64, last: u64 },
}

/// Result type for searchfeed-client operations
pub type Result<T> = std::result::Result<T, ClientError>;
