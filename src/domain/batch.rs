// The batch aggregate: a single auction round moving through commitment,
// reveal, execution and completion. All invariants of the commit-reveal
// protocol are enforced here; orchestrators only sequence I/O around it.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use super::commitment::{BatchId, Commitment, CommitmentHash, UserAddress};
use super::error::BatchError;
use super::events::{DomainEvent, EventData};
use super::metrics::MevMetrics;
use super::transaction::{RevealedTransaction, TransactionData};
use crate::commitment_hash;

pub const DEFAULT_COMMITMENT_DURATION_MINUTES: i64 = 30;
pub const DEFAULT_REVEAL_DURATION_MINUTES: i64 = 15;

/// Lifecycle phase of a batch. Transitions are strictly forward; `Cancelled`
/// is reachable from any non-terminal phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchStatus {
    CommitmentPhase,
    RevealPhase,
    ExecutionPhase,
    Completed,
    Cancelled,
}

impl BatchStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BatchStatus::Completed | BatchStatus::Cancelled)
    }
}

impl Display for BatchStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            BatchStatus::CommitmentPhase => "COMMITMENT_PHASE",
            BatchStatus::RevealPhase => "REVEAL_PHASE",
            BatchStatus::ExecutionPhase => "EXECUTION_PHASE",
            BatchStatus::Completed => "COMPLETED",
            BatchStatus::Cancelled => "CANCELLED",
        };
        write!(f, "{}", name)
    }
}

/// How the final ordering over revealed transactions is derived. The
/// coordinator records the method; the ordering itself is supplied at
/// finalization time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderingMethod {
    CommitReveal,
    ThresholdDecryption,
    TimeBased,
}

impl Display for OrderingMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            OrderingMethod::CommitReveal => "commit-reveal",
            OrderingMethod::ThresholdDecryption => "threshold-decryption",
            OrderingMethod::TimeBased => "time-based",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for OrderingMethod {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "commit-reveal" => Ok(OrderingMethod::CommitReveal),
            "threshold-decryption" => Ok(OrderingMethod::ThresholdDecryption),
            "time-based" => Ok(OrderingMethod::TimeBased),
            _ => Err("unknown ordering method"),
        }
    }
}

/// Inputs to batch creation. Omitted durations fall back to the defaults.
#[derive(Debug, Clone)]
pub struct BatchParams {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub ordering_method: OrderingMethod,
    pub commitment_duration_minutes: Option<i64>,
    pub reveal_duration_minutes: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    id: BatchId,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    ordering_method: OrderingMethod,
    commitment_phase_end: DateTime<Utc>,
    reveal_phase_end: DateTime<Utc>,
    status: BatchStatus,
    commitments: HashMap<UserAddress, Commitment>,
    reveals: HashMap<CommitmentHash, RevealedTransaction>,
    final_ordering: Vec<CommitmentHash>,
    metrics: Option<MevMetrics>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    /// Uncommitted events, drained by the orchestrator after a successful
    /// save. Never persisted.
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

impl Batch {
    pub fn create(params: BatchParams, now: DateTime<Utc>) -> Result<Self, BatchError> {
        if params.end_time <= params.start_time {
            return Err(BatchError::InvalidArgument(
                "end time must be after start time".into(),
            ));
        }
        if params.start_time < now {
            return Err(BatchError::InvalidArgument(
                "start time lies in the past".into(),
            ));
        }

        let commitment_minutes = params
            .commitment_duration_minutes
            .unwrap_or(DEFAULT_COMMITMENT_DURATION_MINUTES);
        let reveal_minutes = params
            .reveal_duration_minutes
            .unwrap_or(DEFAULT_REVEAL_DURATION_MINUTES);
        if commitment_minutes <= 0 || reveal_minutes <= 0 {
            return Err(BatchError::InvalidArgument(
                "phase durations must be positive".into(),
            ));
        }

        let commitment_phase_end = params.start_time + Duration::minutes(commitment_minutes);
        let reveal_phase_end = commitment_phase_end + Duration::minutes(reveal_minutes);
        if reveal_phase_end > params.end_time {
            return Err(BatchError::InvalidArgument(
                "commitment and reveal windows do not fit between start and end".into(),
            ));
        }

        let mut batch = Self {
            id: BatchId::new(),
            start_time: params.start_time,
            end_time: params.end_time,
            ordering_method: params.ordering_method,
            commitment_phase_end,
            reveal_phase_end,
            status: BatchStatus::CommitmentPhase,
            commitments: HashMap::new(),
            reveals: HashMap::new(),
            final_ordering: Vec::new(),
            metrics: None,
            created_at: now,
            updated_at: now,
            events: Vec::new(),
        };
        batch.record(
            now,
            EventData::BatchCreated {
                start_time: batch.start_time,
                end_time: batch.end_time,
                ordering_method: batch.ordering_method,
            },
        );
        Ok(batch)
    }

    /// Accept a commitment while the commitment window is open. One
    /// commitment per user per batch; the first submission wins.
    pub fn add_commitment(
        &mut self,
        commitment: Commitment,
        now: DateTime<Utc>,
    ) -> Result<(), BatchError> {
        if !self.is_in_commitment_phase(now) {
            return Err(BatchError::CommitmentPhaseNotActive);
        }
        if self.commitments.contains_key(&commitment.user_address) {
            return Err(BatchError::CommitmentAlreadyExists(commitment.user_address));
        }

        let user = commitment.user_address;
        let hash = commitment.hash;
        self.commitments.insert(user, commitment);
        self.updated_at = now;
        self.record(
            now,
            EventData::CommitmentAdded {
                user_address: user,
                commitment_hash: hash,
                commitment_count: self.commitments.len(),
            },
        );
        Ok(())
    }

    /// Accept a reveal while the reveal window is open, verifying that the
    /// payload and nonce reproduce the committed digest.
    pub fn reveal_transaction(
        &mut self,
        hash: CommitmentHash,
        transaction: TransactionData,
        user_address: UserAddress,
        nonce: &str,
        now: DateTime<Utc>,
    ) -> Result<(), BatchError> {
        if !self.is_in_reveal_phase(now) {
            return Err(BatchError::RevealPhaseNotActive);
        }
        match self.commitments.get(&user_address) {
            Some(commitment) if commitment.hash == hash => {}
            _ => return Err(BatchError::NoMatchingCommitment(user_address)),
        }
        if !commitment_hash::verify(&hash, &transaction, nonce) {
            return Err(BatchError::TransactionRevealMismatch);
        }

        self.reveals.insert(
            hash,
            RevealedTransaction {
                commitment_hash: hash,
                transaction_data: transaction,
                user_address,
                revealed_at: now,
                nonce: nonce.to_string(),
            },
        );
        self.updated_at = now;
        self.record(
            now,
            EventData::TransactionRevealed {
                user_address,
                commitment_hash: hash,
                revealed_count: self.reveals.len(),
            },
        );
        Ok(())
    }

    pub fn advance_to_reveal(&mut self, now: DateTime<Utc>) -> Result<(), BatchError> {
        self.transition(BatchStatus::CommitmentPhase, BatchStatus::RevealPhase, now)
    }

    pub fn advance_to_execution(&mut self, now: DateTime<Utc>) -> Result<(), BatchError> {
        self.transition(BatchStatus::RevealPhase, BatchStatus::ExecutionPhase, now)
    }

    /// Close the batch with an externally supplied ordering. The ordering
    /// must be a strict permutation of the revealed commitment hashes.
    pub fn finalize(
        &mut self,
        ordering: Vec<CommitmentHash>,
        metrics: MevMetrics,
        now: DateTime<Utc>,
    ) -> Result<(), BatchError> {
        self.expect_status(BatchStatus::ExecutionPhase)?;

        if ordering.len() != self.reveals.len() {
            return Err(BatchError::InvalidArgument(format!(
                "ordering has {} entries but {} transactions were revealed",
                ordering.len(),
                self.reveals.len()
            )));
        }
        let mut seen = HashSet::with_capacity(ordering.len());
        for hash in &ordering {
            if !self.reveals.contains_key(hash) {
                return Err(BatchError::InvalidArgument(format!(
                    "ordering references unrevealed commitment {}",
                    hash
                )));
            }
            if !seen.insert(*hash) {
                return Err(BatchError::InvalidArgument(format!(
                    "ordering repeats commitment {}",
                    hash
                )));
            }
        }

        let total_transactions = metrics.total_transactions;
        let mev_extracted = metrics.extracted_value;
        let savings_generated = metrics.savings_generated;

        self.final_ordering = ordering;
        self.metrics = Some(metrics);
        self.status = BatchStatus::Completed;
        self.updated_at = now;
        self.record(
            now,
            EventData::BatchFinalized {
                total_transactions,
                mev_extracted,
                savings_generated,
                finalized_at: now,
            },
        );
        Ok(())
    }

    /// Administrative abort from any non-terminal phase.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), BatchError> {
        if self.status.is_terminal() {
            return Err(BatchError::InvalidArgument(format!(
                "cannot cancel batch in terminal status {}",
                self.status
            )));
        }
        let from = self.status;
        self.status = BatchStatus::Cancelled;
        self.updated_at = now;
        self.record(
            now,
            EventData::BatchStatusChanged {
                from,
                to: BatchStatus::Cancelled,
                changed_at: now,
            },
        );
        Ok(())
    }

    fn transition(
        &mut self,
        expected: BatchStatus,
        to: BatchStatus,
        now: DateTime<Utc>,
    ) -> Result<(), BatchError> {
        self.expect_status(expected)?;
        self.status = to;
        self.updated_at = now;
        self.record(
            now,
            EventData::BatchStatusChanged {
                from: expected,
                to,
                changed_at: now,
            },
        );
        Ok(())
    }

    fn expect_status(&self, expected: BatchStatus) -> Result<(), BatchError> {
        if self.status != expected {
            return Err(BatchError::InvalidStatus {
                expected,
                actual: self.status,
            });
        }
        Ok(())
    }

    fn record(&mut self, occurred_on: DateTime<Utc>, data: EventData) {
        self.events.push(DomainEvent::new(self.id, occurred_on, data));
    }

    // --- queries ---

    pub fn id(&self) -> BatchId {
        self.id
    }

    pub fn status(&self) -> BatchStatus {
        self.status
    }

    pub fn ordering_method(&self) -> OrderingMethod {
        self.ordering_method
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.end_time
    }

    pub fn commitment_phase_end(&self) -> DateTime<Utc> {
        self.commitment_phase_end
    }

    pub fn reveal_phase_end(&self) -> DateTime<Utc> {
        self.reveal_phase_end
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn commitment_count(&self) -> usize {
        self.commitments.len()
    }

    pub fn revealed_count(&self) -> usize {
        self.reveals.len()
    }

    /// Share of commitments that were revealed, as a percentage.
    /// 0.0 for a batch with no commitments.
    pub fn reveal_rate(&self) -> f64 {
        if self.commitments.is_empty() {
            return 0.0;
        }
        self.reveals.len() as f64 / self.commitments.len() as f64 * 100.0
    }

    /// Whether new commitments are currently acceptable: recorded status AND
    /// the commitment deadline both agree.
    pub fn is_in_commitment_phase(&self, now: DateTime<Utc>) -> bool {
        self.status == BatchStatus::CommitmentPhase && now < self.commitment_phase_end
    }

    /// Whether reveals are currently acceptable.
    pub fn is_in_reveal_phase(&self, now: DateTime<Utc>) -> bool {
        self.status == BatchStatus::RevealPhase && now < self.reveal_phase_end
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.end_time
    }

    pub fn commitment_for(&self, user: &UserAddress) -> Option<&Commitment> {
        self.commitments.get(user)
    }

    pub fn commitments(&self) -> impl Iterator<Item = &Commitment> {
        self.commitments.values()
    }

    pub fn reveal_for(&self, hash: &CommitmentHash) -> Option<&RevealedTransaction> {
        self.reveals.get(hash)
    }

    pub fn reveals(&self) -> impl Iterator<Item = &RevealedTransaction> {
        self.reveals.values()
    }

    pub fn final_ordering(&self) -> &[CommitmentHash] {
        &self.final_ordering
    }

    pub fn metrics(&self) -> Option<&MevMetrics> {
        self.metrics.as_ref()
    }

    /// Drain the uncommitted event buffer, in emission order.
    pub fn take_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn pending_events(&self) -> &[DomainEvent] {
        &self.events
    }
}
