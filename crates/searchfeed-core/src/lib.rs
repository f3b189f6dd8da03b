//! searchfeed-core - Batched document upload with bounded concurrency
//!
//! This crate pushes large document collections to a remote indexing
//! endpoint in fixed-size batches, keeping a bounded number of batches
//! in flight and retrying each batch with exponential backoff. On
//! partial failure only the documents the service rejected are resent;
//! a batch that exhausts its retry budget is reported, not raised.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use searchfeed_core::{BulkUploader, UploadOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let endpoint = Arc::new(my_endpoint); // impl IndexEndpoint<MyDoc>
//!     let uploader = BulkUploader::new(endpoint, UploadOptions::default())?;
//!
//!     let report = uploader.upload(documents).await?;
//!     println!(
//!         "{}/{} documents indexed in {:?}",
//!         report.documents_indexed, report.total_documents, report.elapsed
//!     );
//!     Ok(())
//! }
//! ```

pub mod document;
pub mod endpoint;
pub mod error;
pub mod report;
pub mod uploader;

// Re-exports for convenience
pub use document::IndexDocument;
pub use endpoint::{DocumentOutcome, IndexEndpoint};
pub use error::{EndpointError, Result, UploadError};
pub use report::{AbandonedBatch, UploadReport};
pub use uploader::{BulkUploader, UploadOptions};
