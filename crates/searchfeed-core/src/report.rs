//! Upload outcome reporting.

use std::time::Duration;

use serde::Serialize;

/// A batch given up on after exhausting its retry budget.
#[derive(Debug, Clone, Serialize)]
pub struct AbandonedBatch {
    /// Offset of the batch's first document in the original input
    pub offset: usize,
    /// Attempts made before giving up
    pub attempts: u32,
    /// Documents still unacknowledged when the batch was abandoned
    pub documents_remaining: usize,
}

/// Aggregate statistics from an upload run.
#[derive(Debug, Clone, Serialize)]
pub struct UploadReport {
    /// Documents in the original input
    pub total_documents: usize,
    /// Documents acknowledged by the service
    pub documents_indexed: usize,
    /// Batches the input was partitioned into
    pub batches_submitted: usize,
    /// Network attempts across all batches, retries included
    pub attempts_made: u32,
    /// Wall-clock duration of the whole run
    pub elapsed: Duration,
    /// Batches abandoned after the retry budget ran out, in input order
    pub abandoned: Vec<AbandonedBatch>,
}

impl UploadReport {
    /// Mean wall-clock time per batch.
    pub fn mean_batch_duration(&self) -> Duration {
        if self.batches_submitted == 0 {
            return Duration::ZERO;
        }
        self.elapsed / self.batches_submitted as u32
    }

    /// Mean wall-clock time per input document.
    pub fn mean_document_duration(&self) -> Duration {
        if self.total_documents == 0 {
            return Duration::ZERO;
        }
        self.elapsed / self.total_documents as u32
    }

    /// Starting offsets of abandoned batches.
    pub fn abandoned_offsets(&self) -> Vec<usize> {
        self.abandoned.iter().map(|b| b.offset).collect()
    }

    /// True when every document was acknowledged by the service.
    pub fn is_complete(&self) -> bool {
        self.abandoned.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> UploadReport {
        UploadReport {
            total_documents: 100,
            documents_indexed: 97,
            batches_submitted: 10,
            attempts_made: 12,
            elapsed: Duration::from_secs(20),
            abandoned: vec![AbandonedBatch {
                offset: 30,
                attempts: 5,
                documents_remaining: 3,
            }],
        }
    }

    #[test]
    fn test_mean_durations() {
        let report = sample_report();
        assert_eq!(report.mean_batch_duration(), Duration::from_secs(2));
        assert_eq!(report.mean_document_duration(), Duration::from_millis(200));
    }

    #[test]
    fn test_mean_durations_empty() {
        let report = UploadReport {
            total_documents: 0,
            documents_indexed: 0,
            batches_submitted: 0,
            attempts_made: 0,
            elapsed: Duration::from_secs(1),
            abandoned: vec![],
        };
        assert_eq!(report.mean_batch_duration(), Duration::ZERO);
        assert_eq!(report.mean_document_duration(), Duration::ZERO);
    }

    #[test]
    fn test_completeness() {
        let report = sample_report();
        assert!(!report.is_complete());
        assert_eq!(report.abandoned_offsets(), vec![30]);

        let mut complete = sample_report();
        complete.abandoned.clear();
        assert!(complete.is_complete());
        assert!(complete.abandoned_offsets().is_empty());
    }
}
