//! Behavioral tests for the batched upload engine.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use searchfeed_core::{
    BulkUploader, DocumentOutcome, EndpointError, IndexDocument, IndexEndpoint, UploadError,
    UploadOptions,
};

#[derive(Debug, Clone)]
struct Doc {
    id: String,
}

impl Doc {
    fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl IndexDocument for Doc {
    fn key(&self) -> &str {
        &self.id
    }
}

fn docs(n: usize) -> Vec<Doc> {
    (0..n).map(|i| Doc::new(format!("doc-{i}"))).collect()
}

/// Options tuned for tests: tiny backoff so retries don't slow the suite.
fn fast_options() -> UploadOptions {
    UploadOptions::default().with_initial_backoff(Duration::from_millis(1))
}

fn accept_all(documents: &[Doc]) -> Vec<DocumentOutcome> {
    documents
        .iter()
        .map(|d| DocumentOutcome::success(d.id.as_str()))
        .collect()
}

/// Endpoint that accepts everything and records each submitted batch,
/// tracking the high-water mark of concurrent submissions.
struct RecordingEndpoint {
    batches: Mutex<Vec<Vec<String>>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl RecordingEndpoint {
    fn new() -> Self {
        Self {
            batches: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl IndexEndpoint<Doc> for RecordingEndpoint {
    async fn submit(&self, documents: &[Doc]) -> Result<Vec<DocumentOutcome>, EndpointError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        // Hold the slot long enough for overlap to be observable.
        tokio::time::sleep(Duration::from_millis(10)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.batches
            .lock()
            .unwrap()
            .push(documents.iter().map(|d| d.id.clone()).collect());
        Ok(accept_all(documents))
    }
}

/// Endpoint that rejects the given keys until each has been seen the
/// configured number of times, then accepts it.
struct FlakyEndpoint {
    rejections_left: Mutex<HashMap<String, u32>>,
    batches: Mutex<Vec<Vec<String>>>,
}

impl FlakyEndpoint {
    fn rejecting(keys: &[(&str, u32)]) -> Self {
        Self {
            rejections_left: Mutex::new(
                keys.iter().map(|(k, n)| (k.to_string(), *n)).collect(),
            ),
            batches: Mutex::new(Vec::new()),
        }
    }

    fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl IndexEndpoint<Doc> for FlakyEndpoint {
    async fn submit(&self, documents: &[Doc]) -> Result<Vec<DocumentOutcome>, EndpointError> {
        self.batches
            .lock()
            .unwrap()
            .push(documents.iter().map(|d| d.id.clone()).collect());

        let mut rejections = self.rejections_left.lock().unwrap();
        let outcomes = documents
            .iter()
            .map(|d| match rejections.get_mut(d.key()) {
                Some(left) if *left > 0 => {
                    *left -= 1;
                    DocumentOutcome::failure(
                        d.id.as_str(),
                        Some(422),
                        Some("service busy".into()),
                    )
                }
                _ => DocumentOutcome::success(d.id.as_str()),
            })
            .collect();
        Ok(outcomes)
    }
}

/// Endpoint that always fails at the transport level.
struct DeadEndpoint {
    calls: AtomicUsize,
}

#[async_trait]
impl IndexEndpoint<Doc> for DeadEndpoint {
    async fn submit(&self, _documents: &[Doc]) -> Result<Vec<DocumentOutcome>, EndpointError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(EndpointError::Transport("connection refused".into()))
    }
}

/// Endpoint that records the virtual time of each call, then fails with
/// a transport error until `failures` attempts have been consumed.
struct TimingEndpoint {
    failures: AtomicUsize,
    call_times: Mutex<Vec<tokio::time::Instant>>,
}

#[async_trait]
impl IndexEndpoint<Doc> for TimingEndpoint {
    async fn submit(&self, documents: &[Doc]) -> Result<Vec<DocumentOutcome>, EndpointError> {
        self.call_times.lock().unwrap().push(tokio::time::Instant::now());
        if self.failures.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            Err(EndpointError::Unavailable("warming up".into()))
        } else {
            Ok(accept_all(documents))
        }
    }
}

// ============================================================================
// Partitioning and the happy path
// ============================================================================

#[tokio::test]
async fn ten_documents_in_four_batches_all_succeed() {
    let endpoint = Arc::new(RecordingEndpoint::new());
    let uploader = BulkUploader::<Doc>::new(
        endpoint.clone(),
        fast_options()
            .with_batch_size(3)
            .with_max_concurrent_batches(2),
    )
    .unwrap();

    let report = uploader.upload(docs(10)).await.unwrap();

    assert_eq!(report.total_documents, 10);
    assert_eq!(report.documents_indexed, 10);
    assert_eq!(report.batches_submitted, 4);
    assert_eq!(report.attempts_made, 4);
    assert!(report.is_complete());
    assert!(report.abandoned_offsets().is_empty());

    // Batch sizes are 3,3,3,1 regardless of completion order.
    let mut sizes: Vec<usize> = endpoint.batches().iter().map(|b| b.len()).collect();
    sizes.sort_unstable();
    assert_eq!(sizes, vec![1, 3, 3, 3]);
}

#[tokio::test]
async fn first_attempts_cover_input_exactly_once() {
    let endpoint = Arc::new(RecordingEndpoint::new());
    let uploader = BulkUploader::<Doc>::new(
        endpoint.clone(),
        fast_options()
            .with_batch_size(7)
            .with_max_concurrent_batches(3),
    )
    .unwrap();

    uploader.upload(docs(23)).await.unwrap();

    let mut seen: Vec<String> = endpoint.batches().into_iter().flatten().collect();
    seen.sort();
    let mut expected: Vec<String> = (0..23).map(|i| format!("doc-{i}")).collect();
    expected.sort();
    assert_eq!(seen, expected);
}

#[tokio::test]
async fn concurrency_stays_within_bound() {
    let endpoint = Arc::new(RecordingEndpoint::new());
    let uploader = BulkUploader::<Doc>::new(
        endpoint.clone(),
        fast_options()
            .with_batch_size(1)
            .with_max_concurrent_batches(3),
    )
    .unwrap();

    uploader.upload(docs(12)).await.unwrap();

    let peak = endpoint.max_in_flight.load(Ordering::SeqCst);
    assert!(peak <= 3, "peak concurrency {peak} exceeded the bound");
    assert!(peak >= 1);
}

// ============================================================================
// Partial failure and shrinking
// ============================================================================

#[tokio::test]
async fn partial_failure_retries_only_rejected_documents() {
    let endpoint = Arc::new(FlakyEndpoint::rejecting(&[("doc-1", 1)]));
    let uploader = BulkUploader::<Doc>::new(endpoint.clone(), fast_options().with_batch_size(3)).unwrap();

    let report = uploader.upload(docs(3)).await.unwrap();

    assert!(report.is_complete());
    assert_eq!(report.documents_indexed, 3);
    assert_eq!(report.attempts_made, 2);

    let batches = endpoint.batches();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0], vec!["doc-0", "doc-1", "doc-2"]);
    // The second attempt carries exactly the one rejected document.
    assert_eq!(batches[1], vec!["doc-1"]);
}

#[tokio::test]
async fn accepted_documents_are_never_resent() {
    let endpoint = Arc::new(FlakyEndpoint::rejecting(&[("doc-0", 1), ("doc-2", 2)]));
    let uploader = BulkUploader::<Doc>::new(endpoint.clone(), fast_options().with_batch_size(4)).unwrap();

    let report = uploader.upload(docs(4)).await.unwrap();
    assert!(report.is_complete());

    // A key's submission count is one more than its rejection count:
    // once accepted, it never rides along on a later retry.
    let batches = endpoint.batches();
    let count = |key: &str| batches.iter().flatten().filter(|k| *k == key).count();
    assert_eq!(count("doc-1"), 1);
    assert_eq!(count("doc-3"), 1);
    assert_eq!(count("doc-0"), 2);
    assert_eq!(count("doc-2"), 3);
}

#[tokio::test]
async fn partial_acceptance_before_abandonment_still_counts() {
    // doc-1 and doc-2 are rejected more times than the retry budget allows.
    let endpoint = Arc::new(FlakyEndpoint::rejecting(&[("doc-1", 10), ("doc-2", 10)]));
    let uploader = BulkUploader::<Doc>::new(
        endpoint.clone(),
        fast_options().with_batch_size(3).with_max_retry_attempts(3),
    )
    .unwrap();

    let report = uploader.upload(docs(3)).await.unwrap();

    assert!(!report.is_complete());
    assert_eq!(report.documents_indexed, 1);
    assert_eq!(report.abandoned.len(), 1);
    assert_eq!(report.abandoned[0].offset, 0);
    assert_eq!(report.abandoned[0].attempts, 3);
    assert_eq!(report.abandoned[0].documents_remaining, 2);
}

// ============================================================================
// Transport failure and abandonment
// ============================================================================

#[tokio::test]
async fn transport_failure_makes_exactly_max_attempts() {
    let endpoint = Arc::new(DeadEndpoint {
        calls: AtomicUsize::new(0),
    });
    let uploader = BulkUploader::<Doc>::new(
        endpoint.clone(),
        fast_options().with_batch_size(3).with_max_retry_attempts(5),
    )
    .unwrap();

    let report = uploader.upload(docs(3)).await.unwrap();

    assert_eq!(endpoint.calls.load(Ordering::SeqCst), 5);
    assert_eq!(report.documents_indexed, 0);
    assert_eq!(report.abandoned.len(), 1);
    assert_eq!(report.abandoned[0].attempts, 5);
    assert_eq!(report.abandoned[0].documents_remaining, 3);
    assert_eq!(report.abandoned_offsets(), vec![0]);
}

#[tokio::test]
async fn one_abandoned_batch_does_not_abort_the_run() {
    // All documents of the second batch stay rejected forever.
    let endpoint = Arc::new(FlakyEndpoint::rejecting(&[
        ("doc-3", u32::MAX),
        ("doc-4", u32::MAX),
        ("doc-5", u32::MAX),
    ]));
    let uploader = BulkUploader::<Doc>::new(
        endpoint.clone(),
        fast_options()
            .with_batch_size(3)
            .with_max_concurrent_batches(2)
            .with_max_retry_attempts(2),
    )
    .unwrap();

    let report = uploader.upload(docs(9)).await.unwrap();

    assert_eq!(report.total_documents, 9);
    assert_eq!(report.documents_indexed, 6);
    assert_eq!(report.abandoned_offsets(), vec![3]);
    assert_eq!(report.abandoned[0].documents_remaining, 3);
}

// ============================================================================
// Backoff schedule
// ============================================================================

#[tokio::test(start_paused = true)]
async fn backoff_doubles_between_attempts() {
    let endpoint = Arc::new(TimingEndpoint {
        failures: AtomicUsize::new(3),
        call_times: Mutex::new(Vec::new()),
    });
    let uploader = BulkUploader::<Doc>::new(
        endpoint.clone(),
        UploadOptions::default()
            .with_batch_size(10)
            .with_max_concurrent_batches(1)
            .with_max_retry_attempts(5)
            .with_initial_backoff(Duration::from_millis(100)),
    )
    .unwrap();

    let report = uploader.upload(docs(4)).await.unwrap();
    assert!(report.is_complete());

    let times = endpoint.call_times.lock().unwrap().clone();
    assert_eq!(times.len(), 4);
    assert_eq!(times[1] - times[0], Duration::from_millis(100));
    assert_eq!(times[2] - times[1], Duration::from_millis(200));
    assert_eq!(times[3] - times[2], Duration::from_millis(400));
}

// ============================================================================
// Fail-fast validation
// ============================================================================

#[tokio::test]
async fn empty_input_fails_before_any_network_call() {
    let endpoint = Arc::new(DeadEndpoint {
        calls: AtomicUsize::new(0),
    });
    let uploader = BulkUploader::<Doc>::new(endpoint.clone(), fast_options()).unwrap();

    let err = uploader.upload(Vec::new()).await.unwrap_err();
    assert!(matches!(err, UploadError::EmptyInput));
    assert_eq!(endpoint.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn zero_batch_size_is_rejected_at_construction() {
    let endpoint: Arc<dyn IndexEndpoint<Doc>> = Arc::new(RecordingEndpoint::new());
    let err = BulkUploader::<Doc>::new(endpoint, fast_options().with_batch_size(0)).unwrap_err();
    assert!(matches!(err, UploadError::InvalidOptions(_)));
}
