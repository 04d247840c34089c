//! Batch error types.
//!
//! Errors are categorized by origin:
//!
//! | Category | Variants | Recovery |
//! |----------|----------|----------|
//! | **Transport** | `SubmissionFailed`, `Transport`, `JobNotFound` | Caller decides; never retried here |
//! | **Protocol** | `Protocol` | Fatal to the current refresh round |
//! | **Input contract** | `InvalidMapping`, `InvalidShots`, `EmptyBatch`, `AlreadySubmitted` | Fix input |
//! | **Coordination** | `Timeout`, `NotReady`, `Internal` | Wait longer or inspect the batch |
//!
//! A unit that fails remotely is *not* an error here: it is recorded as
//! [`UnitState::Failed`](crate::job::UnitState::Failed) and reported through
//! the batch result.

use thiserror::Error;

use crate::job::JobStatus;

/// Errors that can occur while coordinating a batch.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HalError {
    // ── Transport errors ─────────────────────────────────────────────
    /// Submitting the unit at `ordinal` failed; later units were not submitted.
    #[error("Submission of unit {ordinal} failed: {message}")]
    SubmissionFailed {
        /// Position of the failing unit in the batch.
        ordinal: usize,
        /// Error reported by the resource.
        message: String,
    },

    /// A call to the remote resource failed.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The remote resource does not know the job.
    #[error("Job not found: {0}")]
    JobNotFound(String),

    // ── Protocol violations ──────────────────────────────────────────
    /// The remote resource answered outside of its contract.
    #[error("Protocol violation: {0}")]
    Protocol(String),

    // ── Input-contract violations ────────────────────────────────────
    /// The remapping table does not fit the measured width.
    #[error("Invalid mapping: {0}")]
    InvalidMapping(String),

    /// Invalid number of shots.
    #[error("Invalid shots: {0}")]
    InvalidShots(String),

    /// A batch needs at least one circuit.
    #[error("Batch contains no circuits")]
    EmptyBatch,

    /// `submit()` was called twice on the same batch.
    #[error("Batch was already submitted")]
    AlreadySubmitted,

    // ── Coordination errors ──────────────────────────────────────────
    /// The batch did not reach a terminal state before the deadline.
    #[error("Timeout waiting for batch {0}")]
    Timeout(String),

    /// Results were requested before the batch reached a terminal state.
    #[error("Batch is not in a final state (aggregate status: {0})")]
    NotReady(JobStatus),

    /// A poll task ended abnormally.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl HalError {
    /// Returns `true` if the operation may succeed when repeated later.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout(_) | Self::NotReady(_))
    }

    /// Returns `true` for programmer errors: bad caller input or a resource
    /// that broke its response contract.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Self::Protocol(_)
                | Self::InvalidMapping(_)
                | Self::InvalidShots(_)
                | Self::EmptyBatch
                | Self::AlreadySubmitted
        )
    }
}

/// Result type for batch operations.
pub type HalResult<T> = Result<T, HalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors() {
        assert!(HalError::Transport("connection reset".into()).is_transient());
        assert!(HalError::Timeout("batch-1".into()).is_transient());
        assert!(HalError::NotReady(JobStatus::Running).is_transient());
        assert!(!HalError::InvalidMapping("partial".into()).is_transient());
        assert!(!HalError::Protocol("bogus".into()).is_transient());
    }

    #[test]
    fn test_contract_violations() {
        assert!(HalError::Protocol("unknown status".into()).is_contract_violation());
        assert!(HalError::InvalidMapping("partial".into()).is_contract_violation());
        assert!(HalError::EmptyBatch.is_contract_violation());
        assert!(!HalError::Transport("down".into()).is_contract_violation());
    }

    #[test]
    fn test_error_display() {
        let err = HalError::SubmissionFailed {
            ordinal: 2,
            message: "quota exceeded".into(),
        };
        assert_eq!(err.to_string(), "Submission of unit 2 failed: quota exceeded");

        let err = HalError::NotReady(JobStatus::Running);
        assert!(err.to_string().contains("Running"));
    }
}
