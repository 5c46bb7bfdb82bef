// Close an executing batch with its externally derived ordering and MEV
// accounting, mirroring the finalization on-chain.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use super::{parse_batch_id, parse_commitment_hash, CoordinatorContext, Envelope};
use crate::domain::{BatchId, BatchStatus, CommitmentHash, MevMetrics};
use crate::error::CoordinatorError;
use crate::numeric::parse_u256;

/// Wire form of the finalization metrics.
#[derive(Debug, Clone, Deserialize)]
pub struct MevMetricsRequest {
    pub extracted_value: String,
    pub savings_generated: String,
    pub total_transactions: u64,
    pub successful_transactions: u64,
    pub average_gas_price: String,
    pub total_gas_used: String,
}

impl MevMetricsRequest {
    fn parse(&self) -> Result<MevMetrics, CoordinatorError> {
        let wei = |name: &str, raw: &str| {
            parse_u256(raw)
                .map_err(|reason| CoordinatorError::Validation(format!("{}: {}", name, reason)))
        };
        Ok(MevMetrics::new(
            wei("extracted value", &self.extracted_value)?,
            wei("savings generated", &self.savings_generated)?,
            self.total_transactions,
            self.successful_transactions,
            wei("average gas price", &self.average_gas_price)?,
            wei("total gas used", &self.total_gas_used)?,
        )?)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FinalizeBatchRequest {
    pub batch_id: String,
    pub ordering: Vec<String>,
    pub metrics: MevMetricsRequest,
}

#[derive(Debug, Serialize)]
pub struct FinalizeBatchResponse {
    pub batch_id: BatchId,
    pub status: BatchStatus,
    pub final_ordering: Vec<CommitmentHash>,
    pub transaction_hash: String,
    pub block_number: u64,
    pub gas_used: u64,
}

pub struct FinalizeBatch {
    ctx: Arc<CoordinatorContext>,
}

impl FinalizeBatch {
    pub fn new(ctx: Arc<CoordinatorContext>) -> Self {
        Self { ctx }
    }

    pub async fn execute(
        &self,
        request: FinalizeBatchRequest,
    ) -> Result<FinalizeBatchResponse, CoordinatorError> {
        let batch_id = parse_batch_id(&request.batch_id)?;
        let ordering = request
            .ordering
            .iter()
            .map(|raw| parse_commitment_hash(raw))
            .collect::<Result<Vec<_>, _>>()?;
        let metrics = request.metrics.parse()?;

        let (_guard, mut batch) = self.ctx.lock_and_load(batch_id).await?;

        let now = self.ctx.clock.now();
        batch.finalize(ordering.clone(), metrics, now)?;

        let receipt = self.ctx.bridge.finalize_batch(batch_id, ordering).await?;
        self.ctx.persist_after_commit(&mut batch).await?;
        self.ctx.metrics.inc_batches_finalized();
        info!(
            batch_id = %batch_id,
            transactions = batch.revealed_count(),
            "batch finalized"
        );

        Ok(FinalizeBatchResponse {
            batch_id,
            status: batch.status(),
            final_ordering: batch.final_ordering().to_vec(),
            transaction_hash: receipt.hash,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
        })
    }

    pub async fn run(&self, request: FinalizeBatchRequest) -> Envelope<FinalizeBatchResponse> {
        Envelope::from_result(self.execute(request).await)
    }
}
