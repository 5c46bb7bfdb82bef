// Port over the on-chain fair-ordering contract. The real adapter (RPC
// client, signer, log decoding) is an external collaborator; `DevBridge`
// below is the in-process stand-in used by the default wiring and tests.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value as JsonValue};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::domain::{BatchId, CommitmentHash, UserAddress};

#[derive(Debug, Clone, Error)]
pub enum BridgeError {
    #[error("blockchain connection error: {0}")]
    Connection(String),

    #[error("contract interaction error: {0}")]
    Contract(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptStatus {
    Success,
    Reverted,
}

/// Outcome of a mirrored contract call.
#[derive(Debug, Clone, Serialize)]
pub struct BridgeReceipt {
    pub hash: String,
    pub block_number: u64,
    pub gas_used: u64,
    pub status: ReceiptStatus,
}

/// Decoded contract log delivered to subscribers.
#[derive(Debug, Clone, Serialize)]
pub struct BridgeLogEvent {
    pub block_number: u64,
    pub transaction_hash: String,
    pub log_index: u64,
    pub args: JsonValue,
    pub event: String,
}

/// On-chain view of one batch.
#[derive(Debug, Clone, Serialize)]
pub struct OnChainBatch {
    pub batch_id: BatchId,
    pub commitment_count: u64,
    pub revealed_count: u64,
    pub finalized: bool,
}

pub type BridgeEventHandler = Arc<dyn Fn(BridgeLogEvent) + Send + Sync>;

pub const EVENT_COMMITMENT_SUBMITTED: &str = "CommitmentSubmitted";
pub const EVENT_TRANSACTION_REVEALED: &str = "TransactionRevealed";
pub const EVENT_BATCH_FINALIZED: &str = "BatchFinalized";

#[async_trait]
pub trait BlockchainBridge: Send + Sync {
    async fn submit_commitment(
        &self,
        batch_id: BatchId,
        user: UserAddress,
        commitment: CommitmentHash,
    ) -> Result<BridgeReceipt, BridgeError>;

    async fn reveal_transaction(
        &self,
        batch_id: BatchId,
        user: UserAddress,
        commitment: CommitmentHash,
        payload: Vec<u8>,
    ) -> Result<BridgeReceipt, BridgeError>;

    async fn create_new_batch(&self, batch_id: BatchId) -> Result<BridgeReceipt, BridgeError>;

    async fn finalize_batch(
        &self,
        batch_id: BatchId,
        ordering: Vec<CommitmentHash>,
    ) -> Result<BridgeReceipt, BridgeError>;

    async fn get_batch_data(&self, batch_id: BatchId)
        -> Result<Option<OnChainBatch>, BridgeError>;

    async fn get_current_active_batch_id(&self) -> Result<Option<BatchId>, BridgeError>;

    async fn get_commitment_hash(
        &self,
        batch_id: BatchId,
        user: UserAddress,
    ) -> Result<Option<CommitmentHash>, BridgeError>;

    async fn on_commitment_submitted(&self, handler: BridgeEventHandler);

    async fn on_transaction_revealed(&self, handler: BridgeEventHandler);

    async fn on_batch_finalized(&self, handler: BridgeEventHandler);

    async fn start_event_listening(&self) -> Result<(), BridgeError>;

    async fn stop_event_listening(&self) -> Result<(), BridgeError>;
}

#[derive(Debug, Clone, Default)]
struct DevBatchRecord {
    commitment_count: u64,
    revealed_count: u64,
    finalized: bool,
}

/// In-process bridge: deterministic receipts, per-batch bookkeeping, and
/// replayed log events for registered subscribers. Failures can be injected
/// to exercise orchestrator rollback paths.
#[derive(Default)]
pub struct DevBridge {
    next_block: AtomicU64,
    next_log_index: AtomicU64,
    listening: AtomicBool,
    batches: RwLock<HashMap<BatchId, DevBatchRecord>>,
    commitments: RwLock<HashMap<(BatchId, UserAddress), CommitmentHash>>,
    active_batch: RwLock<Option<BatchId>>,
    handlers: RwLock<HashMap<&'static str, Vec<BridgeEventHandler>>>,
    injected_failure: parking_lot::Mutex<Option<BridgeError>>,
}

impl DevBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next mutating call fail with `error` (test hook).
    pub fn fail_next_call(&self, error: BridgeError) {
        *self.injected_failure.lock() = Some(error);
    }

    fn take_injected_failure(&self) -> Option<BridgeError> {
        self.injected_failure.lock().take()
    }

    fn receipt(&self, method: &str, detail: &str) -> BridgeReceipt {
        let block_number = self.next_block.fetch_add(1, Ordering::Relaxed) + 1;
        let mut hasher = Sha256::new();
        hasher.update(method.as_bytes());
        hasher.update(detail.as_bytes());
        hasher.update(block_number.to_be_bytes());
        BridgeReceipt {
            hash: format!("0x{}", hex::encode(hasher.finalize())),
            block_number,
            gas_used: 21_000,
            status: ReceiptStatus::Success,
        }
    }

    async fn emit(&self, name: &'static str, receipt: &BridgeReceipt, args: JsonValue) {
        if !self.listening.load(Ordering::Relaxed) {
            return;
        }
        let event = BridgeLogEvent {
            block_number: receipt.block_number,
            transaction_hash: receipt.hash.clone(),
            log_index: self.next_log_index.fetch_add(1, Ordering::Relaxed),
            args,
            event: name.to_string(),
        };
        let handlers = self.handlers.read().await;
        if let Some(subscribers) = handlers.get(name) {
            for handler in subscribers {
                handler(event.clone());
            }
        }
    }

    async fn register(&self, name: &'static str, handler: BridgeEventHandler) {
        self.handlers.write().await.entry(name).or_default().push(handler);
    }
}

#[async_trait]
impl BlockchainBridge for DevBridge {
    async fn submit_commitment(
        &self,
        batch_id: BatchId,
        user: UserAddress,
        commitment: CommitmentHash,
    ) -> Result<BridgeReceipt, BridgeError> {
        if let Some(error) = self.take_injected_failure() {
            return Err(error);
        }
        self.commitments
            .write()
            .await
            .insert((batch_id, user), commitment);
        self.batches
            .write()
            .await
            .entry(batch_id)
            .or_default()
            .commitment_count += 1;

        let receipt = self.receipt("submitCommitment", &format!("{batch_id}:{user}:{commitment}"));
        self.emit(
            EVENT_COMMITMENT_SUBMITTED,
            &receipt,
            json!({
                "batchId": batch_id,
                "user": user,
                "commitment": commitment,
            }),
        )
        .await;
        Ok(receipt)
    }

    async fn reveal_transaction(
        &self,
        batch_id: BatchId,
        user: UserAddress,
        commitment: CommitmentHash,
        payload: Vec<u8>,
    ) -> Result<BridgeReceipt, BridgeError> {
        if let Some(error) = self.take_injected_failure() {
            return Err(error);
        }
        let known = self
            .commitments
            .read()
            .await
            .get(&(batch_id, user))
            .copied();
        match known {
            Some(stored) if stored == commitment => {}
            _ => {
                return Err(BridgeError::Contract(format!(
                    "no commitment stored for {} in batch {}",
                    user, batch_id
                )))
            }
        }
        self.batches
            .write()
            .await
            .entry(batch_id)
            .or_default()
            .revealed_count += 1;

        let receipt = self.receipt(
            "revealTransaction",
            &format!("{batch_id}:{user}:{commitment}:{}", hex::encode(&payload)),
        );
        self.emit(
            EVENT_TRANSACTION_REVEALED,
            &receipt,
            json!({
                "batchId": batch_id,
                "user": user,
                "commitment": commitment,
            }),
        )
        .await;
        Ok(receipt)
    }

    async fn create_new_batch(&self, batch_id: BatchId) -> Result<BridgeReceipt, BridgeError> {
        if let Some(error) = self.take_injected_failure() {
            return Err(error);
        }
        self.batches.write().await.insert(batch_id, DevBatchRecord::default());
        *self.active_batch.write().await = Some(batch_id);
        Ok(self.receipt("createNewBatch", &batch_id.to_string()))
    }

    async fn finalize_batch(
        &self,
        batch_id: BatchId,
        ordering: Vec<CommitmentHash>,
    ) -> Result<BridgeReceipt, BridgeError> {
        if let Some(error) = self.take_injected_failure() {
            return Err(error);
        }
        {
            let mut batches = self.batches.write().await;
            let record = batches.entry(batch_id).or_default();
            if record.finalized {
                return Err(BridgeError::Contract(format!(
                    "batch {} already finalized",
                    batch_id
                )));
            }
            record.finalized = true;
        }
        let mut active = self.active_batch.write().await;
        if *active == Some(batch_id) {
            *active = None;
        }
        drop(active);

        let detail = ordering
            .iter()
            .map(|h| h.to_hex())
            .collect::<Vec<_>>()
            .join(",");
        let receipt = self.receipt("finalizeBatch", &format!("{batch_id}:{detail}"));
        self.emit(
            EVENT_BATCH_FINALIZED,
            &receipt,
            json!({
                "batchId": batch_id,
                "transactionCount": ordering.len(),
            }),
        )
        .await;
        Ok(receipt)
    }

    async fn get_batch_data(
        &self,
        batch_id: BatchId,
    ) -> Result<Option<OnChainBatch>, BridgeError> {
        let batches = self.batches.read().await;
        Ok(batches.get(&batch_id).map(|record| OnChainBatch {
            batch_id,
            commitment_count: record.commitment_count,
            revealed_count: record.revealed_count,
            finalized: record.finalized,
        }))
    }

    async fn get_current_active_batch_id(&self) -> Result<Option<BatchId>, BridgeError> {
        Ok(*self.active_batch.read().await)
    }

    async fn get_commitment_hash(
        &self,
        batch_id: BatchId,
        user: UserAddress,
    ) -> Result<Option<CommitmentHash>, BridgeError> {
        Ok(self.commitments.read().await.get(&(batch_id, user)).copied())
    }

    async fn on_commitment_submitted(&self, handler: BridgeEventHandler) {
        self.register(EVENT_COMMITMENT_SUBMITTED, handler).await;
    }

    async fn on_transaction_revealed(&self, handler: BridgeEventHandler) {
        self.register(EVENT_TRANSACTION_REVEALED, handler).await;
    }

    async fn on_batch_finalized(&self, handler: BridgeEventHandler) {
        self.register(EVENT_BATCH_FINALIZED, handler).await;
    }

    async fn start_event_listening(&self) -> Result<(), BridgeError> {
        self.listening.store(true, Ordering::Relaxed);
        Ok(())
    }

    async fn stop_event_listening(&self) -> Result<(), BridgeError> {
        self.listening.store(false, Ordering::Relaxed);
        Ok(())
    }
}
