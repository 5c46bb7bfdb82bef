// Accept a user's commitment into the active batch and mirror it on-chain.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use super::{
    parse_address, parse_commitment_hash, validate_nonce, CoordinatorContext, Envelope,
};
use crate::domain::{BatchId, Commitment, CommitmentHash, UserAddress};
use crate::error::CoordinatorError;

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitCommitmentRequest {
    pub user_address: String,
    pub commitment_hash: String,
    pub nonce: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubmitCommitmentResponse {
    pub batch_id: BatchId,
    pub user_address: UserAddress,
    pub commitment_hash: CommitmentHash,
    pub commitment_count: usize,
    pub transaction_hash: String,
    pub block_number: u64,
    pub gas_used: u64,
}

pub struct SubmitCommitment {
    ctx: Arc<CoordinatorContext>,
}

impl SubmitCommitment {
    pub fn new(ctx: Arc<CoordinatorContext>) -> Self {
        Self { ctx }
    }

    pub async fn execute(
        &self,
        request: SubmitCommitmentRequest,
    ) -> Result<SubmitCommitmentResponse, CoordinatorError> {
        let user = parse_address(&request.user_address)?;
        let hash = parse_commitment_hash(&request.commitment_hash)?;
        if let Some(nonce) = &request.nonce {
            validate_nonce(nonce)?;
        }

        let batch_id = self.ctx.active_batch_id().await?;
        let (_guard, mut batch) = self.ctx.lock_and_load(batch_id).await?;

        let now = self.ctx.clock.now();
        let commitment = Commitment::new(hash, user, now, request.nonce, now)?;
        batch.add_commitment(commitment, now)?;

        // Bridge failure discards the in-memory mutation above.
        let receipt = self.ctx.bridge.submit_commitment(batch_id, user, hash).await?;
        self.ctx.persist_after_commit(&mut batch).await?;
        self.ctx.metrics.inc_commitments_submitted();
        info!(batch_id = %batch_id, user = %user, "commitment accepted");

        Ok(SubmitCommitmentResponse {
            batch_id,
            user_address: user,
            commitment_hash: hash,
            commitment_count: batch.commitment_count(),
            transaction_hash: receipt.hash,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
        })
    }

    pub async fn run(
        &self,
        request: SubmitCommitmentRequest,
    ) -> Envelope<SubmitCommitmentResponse> {
        Envelope::from_result(self.execute(request).await)
    }
}
