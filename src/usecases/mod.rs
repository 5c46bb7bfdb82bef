// Use-case orchestrators. Every workflow follows the same skeleton:
// validate the request, load the batch, serialize on the batch lock, invoke
// the aggregate, mirror the effect through the bridge, persist, dispatch the
// drained events, and wrap the outcome in a uniform envelope.

pub mod advance_phase;
pub mod cancel_batch;
pub mod create_batch;
pub mod finalize_batch;
pub mod reveal_transaction;
pub mod submit_commitment;

pub use advance_phase::{AdvanceBatchPhase, AdvanceBatchPhaseRequest, PhaseTarget};
pub use cancel_batch::{CancelBatch, CancelBatchRequest};
pub use create_batch::{CreateBatch, CreateBatchRequest};
pub use finalize_batch::{FinalizeBatch, FinalizeBatchRequest, MevMetricsRequest};
pub use reveal_transaction::{
    RevealTransaction, RevealTransactionRequest, TransactionDataRequest,
};
pub use submit_commitment::{SubmitCommitment, SubmitCommitmentRequest};

use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::bridge::BlockchainBridge;
use crate::clock::Clock;
use crate::dispatcher::EventDispatcher;
use crate::domain::commitment::MIN_NONCE_LEN;
use crate::domain::{Batch, BatchId, CommitmentHash, UserAddress};
use crate::error::CoordinatorError;
use crate::repository::BatchRepository;
use crate::service_metrics::ServiceMetrics;

/// Collaborators shared by every use-case, plus the per-batch lock registry
/// that serializes load-mutate-save sequences against one aggregate.
pub struct CoordinatorContext {
    pub repository: Arc<dyn BatchRepository>,
    pub bridge: Arc<dyn BlockchainBridge>,
    pub clock: Arc<dyn Clock>,
    pub dispatcher: Arc<EventDispatcher>,
    pub metrics: Arc<ServiceMetrics>,
    locks: DashMap<BatchId, Arc<Mutex<()>>>,
}

impl CoordinatorContext {
    pub fn new(
        repository: Arc<dyn BatchRepository>,
        bridge: Arc<dyn BlockchainBridge>,
        clock: Arc<dyn Clock>,
        dispatcher: Arc<EventDispatcher>,
        metrics: Arc<ServiceMetrics>,
    ) -> Arc<Self> {
        Arc::new(Self {
            repository,
            bridge,
            clock,
            dispatcher,
            metrics,
            locks: DashMap::new(),
        })
    }

    async fn lock_batch(&self, id: BatchId) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    /// Acquire the batch's mutex, then reload it so the working copy cannot
    /// be stale relative to a concurrent writer.
    pub(crate) async fn lock_and_load(
        &self,
        id: BatchId,
    ) -> Result<(OwnedMutexGuard<()>, Batch), CoordinatorError> {
        let guard = self.lock_batch(id).await;
        let batch = self.repository.find_by_id_or_err(&id).await?;
        Ok((guard, batch))
    }

    /// The batch currently accepting requests, or `NO_ACTIVE_BATCH`.
    pub(crate) async fn active_batch_id(&self) -> Result<BatchId, CoordinatorError> {
        let batch = self
            .repository
            .get_current_active_batch(self.clock.now())
            .await?
            .ok_or(CoordinatorError::NoActiveBatch)?;
        Ok(batch.id())
    }

    /// Persist a mutation that was NOT mirrored on-chain. A failure here is
    /// an ordinary database error; nothing needs reconciling.
    pub(crate) async fn persist(&self, batch: &mut Batch) -> Result<(), CoordinatorError> {
        let events = batch.take_events();
        self.repository.save(batch).await?;
        self.dispatcher.dispatch_all(&events);
        Ok(())
    }

    /// Persist a mutation whose bridge mirror already succeeded. A failure
    /// here leaves the chain ahead of the store and is reported as
    /// `PERSISTENCE_AFTER_COMMIT` for the operator to reconcile via the
    /// bridge's query methods.
    pub(crate) async fn persist_after_commit(
        &self,
        batch: &mut Batch,
    ) -> Result<(), CoordinatorError> {
        let events = batch.take_events();
        if let Err(error) = self.repository.save(batch).await {
            return Err(CoordinatorError::PersistenceAfterCommit(
                batch.id(),
                error.to_string(),
            ));
        }
        self.dispatcher.dispatch_all(&events);
        Ok(())
    }
}

// --- request validation helpers ---

pub(crate) fn parse_address(raw: &str) -> Result<UserAddress, CoordinatorError> {
    raw.parse()
        .map_err(|reason| CoordinatorError::Validation(format!("user address: {}", reason)))
}

pub(crate) fn parse_commitment_hash(raw: &str) -> Result<CommitmentHash, CoordinatorError> {
    raw.parse()
        .map_err(|reason| CoordinatorError::Validation(format!("commitment hash: {}", reason)))
}

pub(crate) fn parse_batch_id(raw: &str) -> Result<BatchId, CoordinatorError> {
    raw.parse()
        .map_err(|reason| CoordinatorError::Validation(format!("batch id: {}", reason)))
}

pub(crate) fn validate_nonce(nonce: &str) -> Result<(), CoordinatorError> {
    if nonce.len() < MIN_NONCE_LEN {
        return Err(CoordinatorError::Validation(format!(
            "nonce must be at least {} characters, got {}",
            MIN_NONCE_LEN,
            nonce.len()
        )));
    }
    Ok(())
}

// --- result envelope ---

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

/// Uniform success/failure shape returned by every use-case.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Envelope<T: Serialize> {
    Ok { ok: bool, value: T },
    Err { ok: bool, error: ErrorBody },
}

impl<T: Serialize> Envelope<T> {
    pub fn from_result(result: Result<T, CoordinatorError>) -> Self {
        match result {
            Ok(value) => Envelope::Ok { ok: true, value },
            Err(error) => Envelope::Err {
                ok: false,
                error: ErrorBody {
                    code: error.code(),
                    message: error.to_string(),
                },
            },
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Envelope::Ok { .. })
    }
}
