use thiserror::Error;

use super::batch::BatchStatus;
use super::commitment::UserAddress;

/// Every way an aggregate operation can be refused. Aggregate entry points
/// are total: they return these as values and never panic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid commitment: {0}")]
    InvalidCommitment(String),

    #[error("Batch is not in commitment phase")]
    CommitmentPhaseNotActive,

    #[error("commitment already exists for user {0}")]
    CommitmentAlreadyExists(UserAddress),

    #[error("reveal phase is not active")]
    RevealPhaseNotActive,

    #[error("no matching commitment for user {0}")]
    NoMatchingCommitment(UserAddress),

    #[error("revealed transaction does not match the stored commitment")]
    TransactionRevealMismatch,

    #[error("invalid batch status: expected {expected}, actual {actual}")]
    InvalidStatus {
        expected: BatchStatus,
        actual: BatchStatus,
    },
}

impl BatchError {
    /// Stable identifier surfaced to API clients alongside the message.
    pub fn code(&self) -> &'static str {
        match self {
            BatchError::InvalidArgument(_) => "INVALID_ARGUMENT",
            BatchError::InvalidCommitment(_) => "INVALID_COMMITMENT",
            BatchError::CommitmentPhaseNotActive => "INVALID_BATCH_STATUS",
            BatchError::CommitmentAlreadyExists(_) => "COMMITMENT_ALREADY_EXISTS",
            BatchError::RevealPhaseNotActive => "REVEAL_PHASE_NOT_ACTIVE",
            BatchError::NoMatchingCommitment(_) => "NO_MATCHING_COMMITMENT",
            BatchError::TransactionRevealMismatch => "TRANSACTION_REVEAL_MISMATCH",
            BatchError::InvalidStatus { .. } => "INVALID_BATCH_STATUS",
        }
    }
}
