// End-to-end scenarios: the coordinator driven through its use-cases with a
// frozen wall clock, asserting statuses, error codes and event order.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::sync::Arc;

use fairbatch::bridge::{BlockchainBridge, DevBridge};
use fairbatch::clock::FixedClock;
use fairbatch::commitment_hash::commitment_hash_of;
use fairbatch::dispatcher::EventDispatcher;
use fairbatch::domain::{BatchId, BatchStatus, CommitmentHash, TransactionData};
use fairbatch::repository::{BatchRepository, MemoryBatchRepository};
use fairbatch::service_metrics::ServiceMetrics;
use fairbatch::usecases::{
    AdvanceBatchPhase, AdvanceBatchPhaseRequest, CoordinatorContext, CreateBatch,
    CreateBatchRequest, FinalizeBatch, FinalizeBatchRequest, MevMetricsRequest, PhaseTarget,
    RevealTransaction, RevealTransactionRequest, SubmitCommitment, SubmitCommitmentRequest,
    TransactionDataRequest,
};
use primitive_types::U256;

const USER_A: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
const USER_C: &str = "0xcccccccccccccccccccccccccccccccccccccccc";
const RECIPIENT: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
const NONCE: &str = "abcdef1234";

fn t0() -> DateTime<Utc> {
    "2026-03-01T12:00:00Z".parse().unwrap()
}

struct Scenario {
    ctx: Arc<CoordinatorContext>,
    clock: Arc<FixedClock>,
    repository: Arc<MemoryBatchRepository>,
    bridge: Arc<DevBridge>,
    events: Arc<Mutex<Vec<String>>>,
}

fn scenario() -> Scenario {
    let clock = Arc::new(FixedClock::new(t0()));
    let repository = Arc::new(MemoryBatchRepository::new());
    let bridge = Arc::new(DevBridge::new());

    let events: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let dispatcher = Arc::new(EventDispatcher::new());
    let sink = events.clone();
    dispatcher.subscribe(move |event| sink.lock().push(event.event_name.to_string()));

    let ctx = CoordinatorContext::new(
        repository.clone(),
        bridge.clone(),
        clock.clone(),
        dispatcher,
        Arc::new(ServiceMetrics::new()),
    );

    Scenario {
        ctx,
        clock,
        repository,
        bridge,
        events,
    }
}

fn tx_request() -> TransactionDataRequest {
    TransactionDataRequest {
        to: RECIPIENT.into(),
        value: "1000".into(),
        data: "0x".into(),
        gas_limit: 21_000,
        gas_price: "1000000000".into(),
        nonce: 0,
    }
}

fn committed_tx() -> TransactionData {
    TransactionData::new(
        RECIPIENT.parse().unwrap(),
        U256::from(1000u64),
        vec![],
        21_000,
        U256::from(1_000_000_000u64),
        0,
    )
    .unwrap()
}

fn commitment() -> CommitmentHash {
    commitment_hash_of(&committed_tx(), NONCE)
}

fn zero_metrics(total: u64, successful: u64) -> MevMetricsRequest {
    MevMetricsRequest {
        extracted_value: "0".into(),
        savings_generated: "0".into(),
        total_transactions: total,
        successful_transactions: successful,
        average_gas_price: "0".into(),
        total_gas_used: "0".into(),
    }
}

async fn open_batch(s: &Scenario) -> BatchId {
    let response = CreateBatch::new(s.ctx.clone())
        .execute(CreateBatchRequest {
            start_time: t0(),
            end_time: t0() + Duration::minutes(60),
            ordering_method: "commit-reveal".into(),
            commitment_duration_minutes: Some(30),
            reveal_duration_minutes: Some(15),
        })
        .await
        .unwrap();
    response.batch_id
}

async fn submit(s: &Scenario, user: &str, hash: CommitmentHash) -> Result<(), String> {
    SubmitCommitment::new(s.ctx.clone())
        .execute(SubmitCommitmentRequest {
            user_address: user.into(),
            commitment_hash: hash.to_hex(),
            nonce: Some(NONCE.into()),
        })
        .await
        .map(|_| ())
        .map_err(|e| e.code().to_string())
}

async fn advance(s: &Scenario, target: PhaseTarget) {
    AdvanceBatchPhase::new(s.ctx.clone())
        .execute(AdvanceBatchPhaseRequest {
            batch_id: None,
            target,
        })
        .await
        .unwrap();
}

async fn status_of(s: &Scenario, id: BatchId) -> BatchStatus {
    s.repository.find_by_id(&id).await.unwrap().unwrap().status()
}

#[tokio::test]
async fn happy_path_runs_commit_reveal_execute_complete() {
    let s = scenario();
    let batch_id = open_batch(&s).await;
    assert_eq!(status_of(&s, batch_id).await, BatchStatus::CommitmentPhase);

    // T0+1s: user commits
    s.clock.set(t0() + Duration::seconds(1));
    let hash = commitment();
    submit(&s, USER_A, hash).await.unwrap();

    // T0+31min: phase advanced, user reveals the committed payload
    s.clock.set(t0() + Duration::minutes(31));
    advance(&s, PhaseTarget::Reveal).await;
    assert_eq!(status_of(&s, batch_id).await, BatchStatus::RevealPhase);

    RevealTransaction::new(s.ctx.clone())
        .execute(RevealTransactionRequest {
            user_address: USER_A.into(),
            commitment_hash: hash.to_hex(),
            transaction: tx_request(),
            nonce: NONCE.into(),
        })
        .await
        .unwrap();

    // T0+46min: execution phase, then finalize with ordering [H]
    s.clock.set(t0() + Duration::minutes(46));
    advance(&s, PhaseTarget::Execution).await;
    assert_eq!(status_of(&s, batch_id).await, BatchStatus::ExecutionPhase);

    let response = FinalizeBatch::new(s.ctx.clone())
        .execute(FinalizeBatchRequest {
            batch_id: batch_id.to_string(),
            ordering: vec![hash.to_hex()],
            metrics: zero_metrics(1, 1),
        })
        .await
        .unwrap();
    assert_eq!(response.status, BatchStatus::Completed);
    assert_eq!(response.final_ordering, vec![hash]);

    let batch = s.repository.find_by_id(&batch_id).await.unwrap().unwrap();
    assert_eq!(batch.status(), BatchStatus::Completed);
    assert_eq!(batch.final_ordering(), &[hash]);

    // the final ordering is a permutation of the reveal keys
    for entry in batch.final_ordering() {
        assert!(batch.reveal_for(entry).is_some());
    }
    assert_eq!(batch.final_ordering().len(), batch.revealed_count());

    assert_eq!(
        *s.events.lock(),
        [
            "BatchCreated",
            "CommitmentAdded",
            "BatchStatusChanged",
            "TransactionRevealed",
            "BatchStatusChanged",
            "BatchFinalized",
        ]
    );

    let on_chain = s.bridge.get_batch_data(batch_id).await.unwrap().unwrap();
    assert!(on_chain.finalized);
}

#[tokio::test]
async fn second_commitment_from_the_same_user_is_rejected() {
    let s = scenario();
    let batch_id = open_batch(&s).await;
    s.clock.set(t0() + Duration::seconds(1));

    submit(&s, USER_A, commitment()).await.unwrap();
    let err = submit(&s, USER_A, CommitmentHash::new([9; 32]))
        .await
        .unwrap_err();
    assert_eq!(err, "COMMITMENT_ALREADY_EXISTS");

    let batch = s.repository.find_by_id(&batch_id).await.unwrap().unwrap();
    assert_eq!(batch.commitment_count(), 1);
}

#[tokio::test]
async fn commitment_after_the_window_closes_is_refused_without_events() {
    let s = scenario();
    open_batch(&s).await;
    s.clock.set(t0() + Duration::minutes(31));

    let before = s.events.lock().len();
    let result = SubmitCommitment::new(s.ctx.clone())
        .execute(SubmitCommitmentRequest {
            user_address: USER_A.into(),
            commitment_hash: commitment().to_hex(),
            nonce: Some(NONCE.into()),
        })
        .await;
    let err = result.unwrap_err();
    assert_eq!(err.to_string(), "Batch is not in commitment phase");
    assert_eq!(s.events.lock().len(), before);
}

#[tokio::test]
async fn reveal_with_the_wrong_nonce_changes_nothing() {
    let s = scenario();
    let batch_id = open_batch(&s).await;
    s.clock.set(t0() + Duration::seconds(1));
    let hash = commitment();
    submit(&s, USER_A, hash).await.unwrap();

    s.clock.set(t0() + Duration::minutes(31));
    advance(&s, PhaseTarget::Reveal).await;

    let err = RevealTransaction::new(s.ctx.clone())
        .execute(RevealTransactionRequest {
            user_address: USER_A.into(),
            commitment_hash: hash.to_hex(),
            transaction: tx_request(),
            nonce: "wrongwrongw".into(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.code(), "TRANSACTION_REVEAL_MISMATCH");

    let batch = s.repository.find_by_id(&batch_id).await.unwrap().unwrap();
    assert_eq!(batch.revealed_count(), 0);
}

#[tokio::test]
async fn advancing_to_execution_from_the_commitment_phase_is_an_illegal_transition() {
    let s = scenario();
    open_batch(&s).await;
    s.clock.set(t0() + Duration::seconds(1));

    let err = AdvanceBatchPhase::new(s.ctx.clone())
        .execute(AdvanceBatchPhaseRequest {
            batch_id: None,
            target: PhaseTarget::Execution,
        })
        .await
        .unwrap_err();
    assert_eq!(err.code(), "INVALID_BATCH_STATUS");
    assert_eq!(
        err.to_string(),
        "invalid batch status: expected REVEAL_PHASE, actual COMMITMENT_PHASE"
    );
}

#[tokio::test]
async fn reveal_rate_reflects_partial_participation() {
    let s = scenario();
    let batch_id = open_batch(&s).await;
    s.clock.set(t0() + Duration::seconds(1));

    let hash = commitment();
    submit(&s, USER_A, hash).await.unwrap();
    submit(&s, USER_C, CommitmentHash::new([7; 32])).await.unwrap();

    s.clock.set(t0() + Duration::minutes(31));
    advance(&s, PhaseTarget::Reveal).await;
    RevealTransaction::new(s.ctx.clone())
        .execute(RevealTransactionRequest {
            user_address: USER_A.into(),
            commitment_hash: hash.to_hex(),
            transaction: tx_request(),
            nonce: NONCE.into(),
        })
        .await
        .unwrap();

    let batch = s.repository.find_by_id(&batch_id).await.unwrap().unwrap();
    assert_eq!(batch.commitment_count(), 2);
    assert_eq!(batch.revealed_count(), 1);
    assert_eq!(batch.reveal_rate(), 50.0);
}

#[tokio::test]
async fn bridge_subscribers_see_mirrored_calls() {
    let s = scenario();
    s.bridge.start_event_listening().await.unwrap();

    let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    s.bridge
        .on_commitment_submitted(Arc::new(move |event| sink.lock().push(event.event)))
        .await;

    open_batch(&s).await;
    s.clock.set(t0() + Duration::seconds(1));
    submit(&s, USER_A, commitment()).await.unwrap();

    assert_eq!(*seen.lock(), ["CommitmentSubmitted"]);
}
