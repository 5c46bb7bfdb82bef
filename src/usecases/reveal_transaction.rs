// Accept a reveal for a previously committed transaction, verifying the
// binding before anything touches the chain or the store.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use super::{
    parse_address, parse_commitment_hash, validate_nonce, CoordinatorContext, Envelope,
};
use crate::commitment_hash::canonical_encoding;
use crate::domain::{BatchId, CommitmentHash, TransactionData, UserAddress};
use crate::error::CoordinatorError;
use crate::numeric::parse_u256;

/// Wire form of the transaction payload being revealed.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionDataRequest {
    pub to: String,
    pub value: String,
    pub data: String,
    pub gas_limit: u64,
    pub gas_price: String,
    pub nonce: u64,
}

impl TransactionDataRequest {
    fn parse(&self) -> Result<TransactionData, CoordinatorError> {
        let to = parse_address(&self.to)?;
        let value = parse_u256(&self.value)
            .map_err(|reason| CoordinatorError::Validation(format!("value: {}", reason)))?;
        let digits = self
            .data
            .strip_prefix("0x")
            .ok_or_else(|| CoordinatorError::Validation("data must start with 0x".into()))?;
        let data = hex::decode(digits)
            .map_err(|e| CoordinatorError::Validation(format!("data: {}", e)))?;
        let gas_price = parse_u256(&self.gas_price)
            .map_err(|reason| CoordinatorError::Validation(format!("gas price: {}", reason)))?;

        Ok(TransactionData::new(
            to,
            value,
            data,
            self.gas_limit,
            gas_price,
            self.nonce,
        )?)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RevealTransactionRequest {
    pub user_address: String,
    pub commitment_hash: String,
    pub transaction: TransactionDataRequest,
    pub nonce: String,
}

#[derive(Debug, Serialize)]
pub struct RevealTransactionResponse {
    pub batch_id: BatchId,
    pub user_address: UserAddress,
    pub commitment_hash: CommitmentHash,
    pub revealed_count: usize,
    pub transaction_hash: String,
    pub block_number: u64,
    pub gas_used: u64,
}

pub struct RevealTransaction {
    ctx: Arc<CoordinatorContext>,
}

impl RevealTransaction {
    pub fn new(ctx: Arc<CoordinatorContext>) -> Self {
        Self { ctx }
    }

    pub async fn execute(
        &self,
        request: RevealTransactionRequest,
    ) -> Result<RevealTransactionResponse, CoordinatorError> {
        let user = parse_address(&request.user_address)?;
        let hash = parse_commitment_hash(&request.commitment_hash)?;
        validate_nonce(&request.nonce)?;
        let transaction = request.transaction.parse()?;

        let batch_id = self.ctx.active_batch_id().await?;
        let (_guard, mut batch) = self.ctx.lock_and_load(batch_id).await?;

        let now = self.ctx.clock.now();
        if let Err(error) =
            batch.reveal_transaction(hash, transaction.clone(), user, &request.nonce, now)
        {
            if matches!(error, crate::domain::BatchError::TransactionRevealMismatch) {
                self.ctx.metrics.inc_reveal_mismatches();
            }
            return Err(error.into());
        }

        let receipt = self
            .ctx
            .bridge
            .reveal_transaction(batch_id, user, hash, canonical_encoding(&transaction))
            .await?;
        self.ctx.persist_after_commit(&mut batch).await?;
        self.ctx.metrics.inc_transactions_revealed();
        info!(batch_id = %batch_id, user = %user, "transaction revealed");

        Ok(RevealTransactionResponse {
            batch_id,
            user_address: user,
            commitment_hash: hash,
            revealed_count: batch.revealed_count(),
            transaction_hash: receipt.hash,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
        })
    }

    pub async fn run(
        &self,
        request: RevealTransactionRequest,
    ) -> Envelope<RevealTransactionResponse> {
        Envelope::from_result(self.execute(request).await)
    }
}
