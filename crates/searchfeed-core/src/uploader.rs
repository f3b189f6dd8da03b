//! Batched upload engine with bounded concurrency and retry.
//!
//! The input is partitioned into contiguous batches which run as
//! independent tasks, at most `max_concurrent_batches` in flight at
//! once; a queued batch is admitted as soon as any running one
//! finishes. Each batch retries with exponential backoff, resending
//! only the documents the service rejected, and is abandoned (reported,
//! not raised) once its retry budget runs out.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{FuturesUnordered, StreamExt};
use tracing::{debug, info, warn};

use crate::document::IndexDocument;
use crate::endpoint::IndexEndpoint;
use crate::error::{Result, UploadError};
use crate::report::{AbandonedBatch, UploadReport};

/// Tuning parameters for a bulk upload.
#[derive(Debug, Clone)]
pub struct UploadOptions {
    /// Documents per batch; the final batch may be shorter
    pub batch_size: usize,
    /// Maximum batches in flight at any instant
    pub max_concurrent_batches: usize,
    /// Attempts per batch before it is abandoned
    pub max_retry_attempts: u32,
    /// Delay before the second attempt; doubles after every failed attempt
    pub initial_backoff: Duration,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent_batches: 4,
            max_retry_attempts: 5,
            initial_backoff: Duration::from_secs(2),
        }
    }
}

impl UploadOptions {
    /// Set the batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the concurrency width.
    pub fn with_max_concurrent_batches(mut self, max: usize) -> Self {
        self.max_concurrent_batches = max;
        self
    }

    /// Set the per-batch retry budget.
    pub fn with_max_retry_attempts(mut self, attempts: u32) -> Self {
        self.max_retry_attempts = attempts;
        self
    }

    /// Set the delay before the first retry.
    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    /// Check that every parameter is in range.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(UploadError::InvalidOptions(
                "batch_size must be at least 1".into(),
            ));
        }
        if self.max_concurrent_batches == 0 {
            return Err(UploadError::InvalidOptions(
                "max_concurrent_batches must be at least 1".into(),
            ));
        }
        if self.max_retry_attempts == 0 {
            return Err(UploadError::InvalidOptions(
                "max_retry_attempts must be at least 1".into(),
            ));
        }
        if self.initial_backoff.is_zero() {
            return Err(UploadError::InvalidOptions(
                "initial_backoff must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Retry state for one batch, owned exclusively by its task.
struct RetryState<D> {
    offset: usize,
    /// Documents not yet acknowledged by the service
    pending: Vec<D>,
    attempt: u32,
    backoff: Duration,
}

/// Terminal result of one batch's retry sequence.
enum BatchOutcome {
    Completed {
        attempts: u32,
        documents: usize,
    },
    Abandoned {
        offset: usize,
        attempts: u32,
        documents_remaining: usize,
        documents_accepted: usize,
    },
}

/// Uploads document collections in bounded-concurrency batches.
pub struct BulkUploader<D: IndexDocument> {
    endpoint: Arc<dyn IndexEndpoint<D>>,
    options: UploadOptions,
}

impl<D: IndexDocument> std::fmt::Debug for BulkUploader<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BulkUploader")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<D: IndexDocument> BulkUploader<D> {
    /// Create an uploader over a shared endpoint.
    ///
    /// Fails fast on out-of-range options, before any network activity.
    pub fn new(endpoint: Arc<dyn IndexEndpoint<D>>, options: UploadOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self { endpoint, options })
    }

    /// Get the active tuning parameters.
    pub fn options(&self) -> &UploadOptions {
        &self.options
    }

    /// Upload `documents` and report the result.
    ///
    /// Returns `Err` only for an empty input; batches that exhaust
    /// their retry budget surface in [`UploadReport::abandoned`].
    pub async fn upload(&self, documents: Vec<D>) -> Result<UploadReport> {
        if documents.is_empty() {
            return Err(UploadError::EmptyInput);
        }

        let total_documents = documents.len();
        let started = Instant::now();
        let mut queue = partition(documents, self.options.batch_size);
        let batches_submitted = queue.len();

        info!(
            "Uploading {} documents in {} batches of up to {} ({} in flight)",
            total_documents, batches_submitted, self.options.batch_size,
            self.options.max_concurrent_batches
        );

        let mut in_flight = FuturesUnordered::new();
        let mut outcomes = Vec::with_capacity(batches_submitted);

        while let Some((offset, batch)) = queue.pop_front() {
            in_flight.push(self.run_batch(offset, batch));

            // Admit the next queued batch only once a slot frees up.
            if in_flight.len() >= self.options.max_concurrent_batches {
                if let Some(outcome) = in_flight.next().await {
                    outcomes.push(outcome);
                }
            }
        }
        while let Some(outcome) = in_flight.next().await {
            outcomes.push(outcome);
        }

        let elapsed = started.elapsed();

        let mut documents_indexed = 0;
        let mut attempts_made = 0;
        let mut abandoned = Vec::new();
        for outcome in outcomes {
            match outcome {
                BatchOutcome::Completed {
                    attempts,
                    documents,
                } => {
                    attempts_made += attempts;
                    documents_indexed += documents;
                }
                BatchOutcome::Abandoned {
                    offset,
                    attempts,
                    documents_remaining,
                    documents_accepted,
                } => {
                    attempts_made += attempts;
                    documents_indexed += documents_accepted;
                    abandoned.push(AbandonedBatch {
                        offset,
                        attempts,
                        documents_remaining,
                    });
                }
            }
        }
        abandoned.sort_unstable_by_key(|b| b.offset);

        let report = UploadReport {
            total_documents,
            documents_indexed,
            batches_submitted,
            attempts_made,
            elapsed,
            abandoned,
        };

        info!(
            "Upload finished: {}/{} documents indexed in {:.2?}, {} batches abandoned",
            report.documents_indexed,
            report.total_documents,
            report.elapsed,
            report.abandoned.len()
        );

        Ok(report)
    }

    /// Run one batch to completion or abandonment.
    ///
    /// All retry state lives in this task; nothing is shared with
    /// sibling batches.
    async fn run_batch(&self, offset: usize, documents: Vec<D>) -> BatchOutcome {
        let original = documents.len();
        let mut state = RetryState {
            offset,
            pending: documents,
            attempt: 0,
            backoff: self.options.initial_backoff,
        };

        loop {
            state.attempt += 1;
            debug!(
                "Batch at offset {}: attempt {} with {} documents",
                state.offset,
                state.attempt,
                state.pending.len()
            );

            match self.endpoint.submit(&state.pending).await {
                Ok(results) => {
                    let accepted: HashSet<&str> = results
                        .iter()
                        .filter(|o| o.succeeded)
                        .map(|o| o.key.as_str())
                        .collect();

                    // Anything the response did not confirm is resent;
                    // absence of an outcome is not success.
                    let rejected: Vec<D> = state
                        .pending
                        .iter()
                        .filter(|d| !accepted.contains(d.key()))
                        .cloned()
                        .collect();

                    if rejected.is_empty() {
                        debug!(
                            "Batch at offset {} completed after {} attempts",
                            state.offset, state.attempt
                        );
                        return BatchOutcome::Completed {
                            attempts: state.attempt,
                            documents: original,
                        };
                    }

                    if state.attempt == self.options.max_retry_attempts {
                        warn!(
                            "Giving up on batch at offset {} after {} attempts, {} documents unacknowledged",
                            state.offset,
                            state.attempt,
                            rejected.len()
                        );
                        return BatchOutcome::Abandoned {
                            offset: state.offset,
                            attempts: state.attempt,
                            documents_remaining: rejected.len(),
                            documents_accepted: original - rejected.len(),
                        };
                    }

                    warn!(
                        "Batch at offset {} had partial failure, retrying {} of {} documents in {:?}",
                        state.offset,
                        rejected.len(),
                        state.pending.len(),
                        state.backoff
                    );
                    state.pending = rejected;
                }
                Err(err) => {
                    if state.attempt == self.options.max_retry_attempts {
                        warn!(
                            "Giving up on batch at offset {} after {} attempts: {}",
                            state.offset, state.attempt, err
                        );
                        return BatchOutcome::Abandoned {
                            offset: state.offset,
                            attempts: state.attempt,
                            documents_remaining: state.pending.len(),
                            documents_accepted: original - state.pending.len(),
                        };
                    }

                    warn!(
                        "Batch at offset {} failed ({}), retrying all {} documents in {:?}",
                        state.offset,
                        err,
                        state.pending.len(),
                        state.backoff
                    );
                }
            }

            tokio::time::sleep(state.backoff).await;
            state.backoff *= 2;
        }
    }
}

/// Partition documents into contiguous batches with their input offsets.
fn partition<D>(documents: Vec<D>, batch_size: usize) -> VecDeque<(usize, Vec<D>)> {
    let mut queue = VecDeque::new();
    let mut rest = documents;
    let mut offset = 0;
    while !rest.is_empty() {
        let take = batch_size.min(rest.len());
        let tail = rest.split_off(take);
        queue.push_back((offset, rest));
        rest = tail;
        offset += take;
    }
    queue
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options_valid() {
        let options = UploadOptions::default();
        assert!(options.validate().is_ok());
        assert_eq!(options.batch_size, 1000);
        assert_eq!(options.max_concurrent_batches, 4);
        assert_eq!(options.max_retry_attempts, 5);
        assert_eq!(options.initial_backoff, Duration::from_secs(2));
    }

    #[test]
    fn test_options_builder() {
        let options = UploadOptions::default()
            .with_batch_size(250)
            .with_max_concurrent_batches(8)
            .with_max_retry_attempts(3)
            .with_initial_backoff(Duration::from_millis(500));

        assert_eq!(options.batch_size, 250);
        assert_eq!(options.max_concurrent_batches, 8);
        assert_eq!(options.max_retry_attempts, 3);
        assert_eq!(options.initial_backoff, Duration::from_millis(500));
    }

    #[test]
    fn test_options_rejected_out_of_range() {
        assert!(UploadOptions::default()
            .with_batch_size(0)
            .validate()
            .is_err());
        assert!(UploadOptions::default()
            .with_max_concurrent_batches(0)
            .validate()
            .is_err());
        assert!(UploadOptions::default()
            .with_max_retry_attempts(0)
            .validate()
            .is_err());
        assert!(UploadOptions::default()
            .with_initial_backoff(Duration::ZERO)
            .validate()
            .is_err());
    }

    #[test]
    fn test_partition_sizes_and_offsets() {
        let docs: Vec<u32> = (0..10).collect();
        let batches = partition(docs, 3);

        let shapes: Vec<(usize, usize)> =
            batches.iter().map(|(o, b)| (*o, b.len())).collect();
        assert_eq!(shapes, vec![(0, 3), (3, 3), (6, 3), (9, 1)]);
    }

    #[test]
    fn test_partition_single_batch() {
        let docs: Vec<u32> = (0..5).collect();
        let batches = partition(docs, 100);
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].0, 0);
        assert_eq!(batches[0].1.len(), 5);
    }

    #[test]
    fn test_partition_exact_multiple() {
        let docs: Vec<u32> = (0..9).collect();
        let batches = partition(docs, 3);
        assert_eq!(batches.len(), 3);
        assert!(batches.iter().all(|(_, b)| b.len() == 3));
    }
}
