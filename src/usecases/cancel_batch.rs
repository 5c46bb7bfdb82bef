// Administrative abort of a running batch. Purely off-chain bookkeeping;
// committed fees and on-chain state are the contract's concern.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use super::{parse_batch_id, CoordinatorContext, Envelope};
use crate::domain::{BatchId, BatchStatus};
use crate::error::CoordinatorError;

#[derive(Debug, Clone, Deserialize)]
pub struct CancelBatchRequest {
    pub batch_id: String,
}

#[derive(Debug, Serialize)]
pub struct CancelBatchResponse {
    pub batch_id: BatchId,
    pub status: BatchStatus,
}

pub struct CancelBatch {
    ctx: Arc<CoordinatorContext>,
}

impl CancelBatch {
    pub fn new(ctx: Arc<CoordinatorContext>) -> Self {
        Self { ctx }
    }

    pub async fn execute(
        &self,
        request: CancelBatchRequest,
    ) -> Result<CancelBatchResponse, CoordinatorError> {
        let batch_id = parse_batch_id(&request.batch_id)?;
        let (_guard, mut batch) = self.ctx.lock_and_load(batch_id).await?;

        batch.cancel(self.ctx.clock.now())?;
        self.ctx.persist(&mut batch).await?;
        warn!(batch_id = %batch_id, "batch cancelled");

        Ok(CancelBatchResponse {
            batch_id,
            status: batch.status(),
        })
    }

    pub async fn run(&self, request: CancelBatchRequest) -> Envelope<CancelBatchResponse> {
        Envelope::from_result(self.execute(request).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Batch, BatchParams, OrderingMethod};
    use crate::repository::BatchRepository;
    use crate::usecases::test_support::{harness, t0};
    use chrono::Duration;

    #[tokio::test]
    async fn cancels_a_running_batch_once() {
        let h = harness();
        let mut batch = Batch::create(
            BatchParams {
                start_time: t0(),
                end_time: t0() + Duration::minutes(60),
                ordering_method: OrderingMethod::CommitReveal,
                commitment_duration_minutes: None,
                reveal_duration_minutes: None,
            },
            t0(),
        )
        .unwrap();
        batch.take_events();
        h.ctx.repository.save(&batch).await.unwrap();

        let usecase = CancelBatch::new(h.ctx.clone());
        let response = usecase
            .execute(CancelBatchRequest {
                batch_id: batch.id().to_string(),
            })
            .await
            .unwrap();
        assert_eq!(response.status, BatchStatus::Cancelled);

        // already terminal
        let err = usecase
            .execute(CancelBatchRequest {
                batch_id: batch.id().to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_ARGUMENT");
    }
}
