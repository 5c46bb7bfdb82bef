// Domain events appended by the batch aggregate and drained by the
// dispatcher once the mutation has been persisted.

use chrono::{DateTime, Utc};
use primitive_types::U256;
use serde::Serialize;

use super::batch::{BatchStatus, OrderingMethod};
use super::commitment::{BatchId, CommitmentHash, UserAddress};
use crate::numeric::u256_dec;

pub const EVENT_VERSION: u16 = 1;

/// Envelope shared by every event: who emitted it, when, and a typed body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainEvent {
    pub aggregate_id: BatchId,
    pub event_name: &'static str,
    pub occurred_on: DateTime<Utc>,
    pub event_version: u16,
    #[serde(rename = "eventData")]
    pub data: EventData,
}

impl DomainEvent {
    pub fn new(aggregate_id: BatchId, occurred_on: DateTime<Utc>, data: EventData) -> Self {
        Self {
            aggregate_id,
            event_name: data.name(),
            occurred_on,
            event_version: EVENT_VERSION,
            data,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum EventData {
    #[serde(rename_all = "camelCase")]
    BatchCreated {
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        ordering_method: OrderingMethod,
    },
    #[serde(rename_all = "camelCase")]
    CommitmentAdded {
        user_address: UserAddress,
        commitment_hash: CommitmentHash,
        commitment_count: usize,
    },
    #[serde(rename_all = "camelCase")]
    TransactionRevealed {
        user_address: UserAddress,
        commitment_hash: CommitmentHash,
        revealed_count: usize,
    },
    #[serde(rename_all = "camelCase")]
    BatchStatusChanged {
        from: BatchStatus,
        to: BatchStatus,
        changed_at: DateTime<Utc>,
    },
    #[serde(rename_all = "camelCase")]
    BatchFinalized {
        total_transactions: u64,
        #[serde(with = "u256_dec")]
        mev_extracted: U256,
        #[serde(with = "u256_dec")]
        savings_generated: U256,
        finalized_at: DateTime<Utc>,
    },
}

impl EventData {
    pub fn name(&self) -> &'static str {
        match self {
            EventData::BatchCreated { .. } => "BatchCreated",
            EventData::CommitmentAdded { .. } => "CommitmentAdded",
            EventData::TransactionRevealed { .. } => "TransactionRevealed",
            EventData::BatchStatusChanged { .. } => "BatchStatusChanged",
            EventData::BatchFinalized { .. } => "BatchFinalized",
        }
    }
}
