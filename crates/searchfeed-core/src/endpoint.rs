//! Remote bulk-write endpoint abstraction.

use async_trait::async_trait;

use crate::document::IndexDocument;
use crate::error::EndpointError;

/// Per-document result of a batch submission.
#[derive(Debug, Clone)]
pub struct DocumentOutcome {
    /// Document key as echoed by the service
    pub key: String,
    /// Whether the service accepted the document
    pub succeeded: bool,
    /// Per-document status code, when the service provides one
    pub status_code: Option<u16>,
    /// Service-provided message for rejected documents
    pub message: Option<String>,
}

impl DocumentOutcome {
    /// Outcome for an accepted document.
    pub fn success(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            succeeded: true,
            status_code: None,
            message: None,
        }
    }

    /// Outcome for a rejected document.
    pub fn failure(
        key: impl Into<String>,
        status_code: Option<u16>,
        message: Option<String>,
    ) -> Self {
        Self {
            key: key.into(),
            succeeded: false,
            status_code,
            message,
        }
    }
}

/// A remote bulk-write endpoint.
///
/// One call submits one batch. A response that rejects some documents
/// is still `Ok`, with `succeeded == false` rows for the rejected keys;
/// `Err` means the submission failed as a whole and no per-document
/// detail is available. Implementations must be shareable read-only
/// across concurrent batch tasks.
#[async_trait]
pub trait IndexEndpoint<D: IndexDocument>: Send + Sync {
    /// Submit a batch and return one outcome per document.
    async fn submit(&self, documents: &[D]) -> Result<Vec<DocumentOutcome>, EndpointError>;
}
