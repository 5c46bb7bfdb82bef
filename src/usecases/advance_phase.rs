// Make a batch's recorded status catch up with its deadlines. On-chain
// phase transitions are deadline-gated by the contract itself, so there is
// no bridge mirror here.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use super::{parse_batch_id, CoordinatorContext, Envelope};
use crate::domain::{BatchId, BatchStatus};
use crate::error::CoordinatorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseTarget {
    Reveal,
    Execution,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdvanceBatchPhaseRequest {
    /// Batch to advance; the currently active batch when omitted.
    pub batch_id: Option<String>,
    pub target: PhaseTarget,
}

#[derive(Debug, Serialize)]
pub struct AdvanceBatchPhaseResponse {
    pub batch_id: BatchId,
    pub from: BatchStatus,
    pub to: BatchStatus,
}

pub struct AdvanceBatchPhase {
    ctx: Arc<CoordinatorContext>,
}

impl AdvanceBatchPhase {
    pub fn new(ctx: Arc<CoordinatorContext>) -> Self {
        Self { ctx }
    }

    pub async fn execute(
        &self,
        request: AdvanceBatchPhaseRequest,
    ) -> Result<AdvanceBatchPhaseResponse, CoordinatorError> {
        let batch_id = match &request.batch_id {
            Some(raw) => parse_batch_id(raw)?,
            None => self.ctx.active_batch_id().await?,
        };
        let (_guard, mut batch) = self.ctx.lock_and_load(batch_id).await?;

        let now = self.ctx.clock.now();
        let from = batch.status();
        match request.target {
            PhaseTarget::Reveal => batch.advance_to_reveal(now)?,
            PhaseTarget::Execution => batch.advance_to_execution(now)?,
        }
        let to = batch.status();

        self.ctx.persist(&mut batch).await?;
        info!(batch_id = %batch_id, %from, %to, "batch phase advanced");

        Ok(AdvanceBatchPhaseResponse { batch_id, from, to })
    }

    pub async fn run(
        &self,
        request: AdvanceBatchPhaseRequest,
    ) -> Envelope<AdvanceBatchPhaseResponse> {
        Envelope::from_result(self.execute(request).await)
    }
}
