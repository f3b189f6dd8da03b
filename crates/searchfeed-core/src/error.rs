//! Error types for searchfeed-core

use thiserror::Error;

/// Errors from a single batch submission to the remote endpoint.
///
/// Every variant counts against a batch's retry budget the same way;
/// per-document detail only travels in a successful response, so a
/// submission that ends here always retries the whole remaining batch.
#[derive(Error, Debug)]
pub enum EndpointError {
    /// Connection-level failure before a response was received
    #[error("transport error: {0}")]
    Transport(String),

    /// Request timed out
    #[error("request timed out")]
    Timeout,

    /// Service rejected the request wholesale for throttling
    #[error("rate limited, retry after {retry_after:?} seconds")]
    RateLimited { retry_after: Option<u64> },

    /// Credentials were rejected
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Service temporarily unavailable
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// Response could not be interpreted
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// A document in the batch could not be represented on the wire
    #[error("invalid document '{key}': {message}")]
    InvalidDocument { key: String, message: String },
}

/// Errors raised by the uploader before any network activity.
///
/// Retry exhaustion is not an error; abandoned batches surface in the
/// final [`UploadReport`](crate::report::UploadReport) instead.
#[derive(Error, Debug)]
pub enum UploadError {
    /// Out-of-range tuning parameters
    #[error("invalid upload options: {0}")]
    InvalidOptions(String),

    /// Nothing to upload
    #[error("no documents to upload")]
    EmptyInput,
}

/// Result type for searchfeed-core operations
pub type Result<T> = std::result::Result<T, UploadError>;
