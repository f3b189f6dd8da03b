//! searchfeed-client - HTTP bulk-indexing client
//!
//! Implements the [`IndexEndpoint`](searchfeed_core::IndexEndpoint)
//! seam over the JSON bulk-indexing REST dialect spoken by Azure AI
//! Search-compatible services: batches go to
//! `POST {endpoint}/indexes/{index}/docs/index` as
//! `{"value":[{"@search.action": ...}, ...]}` and the 200/207 response
//! carries one status row per document key. Also provides the index
//! utility calls (document count, statistics, delete) used for
//! post-upload validation, and [`JsonDocument`] for feeding arbitrary
//! JSON keyed by a named field.
//!
//! The client submits each batch exactly once; retry and backoff are
//! owned by the uploader in `searchfeed-core`.

pub mod client;
pub mod config;
pub mod document;
pub mod error;

// Re-exports for convenience
pub use client::{IndexStats, SearchIndexClient};
pub use config::{ApiKeyAuth, IndexAction, ServiceConfig};
pub use document::{estimate_size_mb, generate_documents, JsonDocument, PayloadProfile};
pub use error::{ClientError, Result};
