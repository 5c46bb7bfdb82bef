// Open a new auction round: build the aggregate, mirror the batch on-chain,
// persist.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use super::{CoordinatorContext, Envelope};
use crate::domain::{Batch, BatchId, BatchParams, BatchStatus, OrderingMethod};
use crate::error::CoordinatorError;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBatchRequest {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub ordering_method: String,
    pub commitment_duration_minutes: Option<i64>,
    pub reveal_duration_minutes: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CreateBatchResponse {
    pub batch_id: BatchId,
    pub status: BatchStatus,
    pub commitment_phase_end: DateTime<Utc>,
    pub reveal_phase_end: DateTime<Utc>,
    pub transaction_hash: String,
    pub block_number: u64,
    pub gas_used: u64,
}

pub struct CreateBatch {
    ctx: Arc<CoordinatorContext>,
}

impl CreateBatch {
    pub fn new(ctx: Arc<CoordinatorContext>) -> Self {
        Self { ctx }
    }

    pub async fn execute(
        &self,
        request: CreateBatchRequest,
    ) -> Result<CreateBatchResponse, CoordinatorError> {
        let ordering_method: OrderingMethod = request
            .ordering_method
            .parse()
            .map_err(|reason| {
                CoordinatorError::Validation(format!("ordering method: {}", reason))
            })?;

        let now = self.ctx.clock.now();
        let mut batch = Batch::create(
            BatchParams {
                start_time: request.start_time,
                end_time: request.end_time,
                ordering_method,
                commitment_duration_minutes: request.commitment_duration_minutes,
                reveal_duration_minutes: request.reveal_duration_minutes,
            },
            now,
        )?;

        let receipt = self.ctx.bridge.create_new_batch(batch.id()).await?;
        self.ctx.persist_after_commit(&mut batch).await?;
        self.ctx.metrics.inc_batches_created();
        info!(batch_id = %batch.id(), method = %ordering_method, "batch created");

        Ok(CreateBatchResponse {
            batch_id: batch.id(),
            status: batch.status(),
            commitment_phase_end: batch.commitment_phase_end(),
            reveal_phase_end: batch.reveal_phase_end(),
            transaction_hash: receipt.hash,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
        })
    }

    pub async fn run(&self, request: CreateBatchRequest) -> Envelope<CreateBatchResponse> {
        Envelope::from_result(self.execute(request).await)
    }
}
