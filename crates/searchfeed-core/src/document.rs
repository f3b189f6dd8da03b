//! Document key extraction.

/// A document that can be submitted to an indexing endpoint.
///
/// The key uniquely identifies the document within its index. It is how
/// per-document outcomes returned by the service are matched back to
/// the documents that must be resent after a partial failure.
pub trait IndexDocument: Clone + Send + Sync + 'static {
    /// Unique document key within the target index.
    fn key(&self) -> &str;
}
