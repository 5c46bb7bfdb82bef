// Storage port for batches. Production adapters (Postgres, Redis cache)
// live outside this crate; the in-memory implementation below backs the
// default wiring and the test suite.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use primitive_types::U256;
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::domain::{Batch, BatchId, BatchStatus, OrderingMethod};
use crate::numeric::u256_dec;

#[derive(Debug, Clone, Error)]
pub enum RepositoryError {
    #[error("batch {0} not found")]
    NotFound(BatchId),

    #[error("database error: {0}")]
    Database(String),
}

/// Optional narrowing criteria for paginated listings.
#[derive(Debug, Clone, Default)]
pub struct BatchFilters {
    pub status: Option<BatchStatus>,
    pub ordering_method: Option<OrderingMethod>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub pages: usize,
}

/// Aggregated figures over batches created inside a date range.
#[derive(Debug, Clone, Serialize)]
pub struct BatchStatistics {
    pub total_batches: u64,
    pub completed_batches: u64,
    pub average_commitments: f64,
    pub average_reveal_rate: f64,
    #[serde(with = "u256_dec")]
    pub total_mev_extracted: U256,
    #[serde(with = "u256_dec")]
    pub total_savings_generated: U256,
}

#[async_trait]
pub trait BatchRepository: Send + Sync {
    async fn save(&self, batch: &Batch) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: &BatchId) -> Result<Option<Batch>, RepositoryError>;

    async fn find_by_id_or_err(&self, id: &BatchId) -> Result<Batch, RepositoryError> {
        self.find_by_id(id)
            .await?
            .ok_or(RepositoryError::NotFound(*id))
    }

    async fn delete(&self, id: &BatchId) -> Result<(), RepositoryError>;

    /// The unique non-terminal batch whose `[start_time, end_time)` window
    /// contains `now`. When several overlap, the one with the latest start.
    async fn get_current_active_batch(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<Batch>, RepositoryError>;

    async fn find_by_status(&self, status: BatchStatus) -> Result<Vec<Batch>, RepositoryError>;

    /// Most recently created batches, newest first.
    async fn find_recent(&self, limit: usize) -> Result<Vec<Batch>, RepositoryError>;

    /// Batches whose start time falls inside `[from, to]`.
    async fn find_in_date_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Batch>, RepositoryError>;

    /// Newest-first page of batches matching the filters. `page` is
    /// 1-based.
    async fn find_all_paginated(
        &self,
        page: usize,
        limit: usize,
        filters: BatchFilters,
    ) -> Result<Page<Batch>, RepositoryError>;

    /// Aggregates over batches created inside `[from, to]`.
    async fn statistics(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<BatchStatistics, RepositoryError>;

    async fn exists(&self, id: &BatchId) -> Result<bool, RepositoryError>;

    async fn count_by_status(&self, status: BatchStatus) -> Result<usize, RepositoryError>;

    /// Batches whose end time has passed.
    async fn find_expired(&self, now: DateTime<Utc>) -> Result<Vec<Batch>, RepositoryError>;
}

/// In-memory repository with read-your-writes semantics for a single batch
/// id. Suitable for development wiring and tests.
#[derive(Default)]
pub struct MemoryBatchRepository {
    batches: RwLock<HashMap<BatchId, Batch>>,
}

impl MemoryBatchRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn matches(batch: &Batch, filters: &BatchFilters) -> bool {
        if let Some(status) = filters.status {
            if batch.status() != status {
                return false;
            }
        }
        if let Some(method) = filters.ordering_method {
            if batch.ordering_method() != method {
                return false;
            }
        }
        if let Some(from) = filters.date_from {
            if batch.created_at() < from {
                return false;
            }
        }
        if let Some(to) = filters.date_to {
            if batch.created_at() > to {
                return false;
            }
        }
        true
    }
}

#[async_trait]
impl BatchRepository for MemoryBatchRepository {
    async fn save(&self, batch: &Batch) -> Result<(), RepositoryError> {
        self.batches.write().await.insert(batch.id(), batch.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &BatchId) -> Result<Option<Batch>, RepositoryError> {
        Ok(self.batches.read().await.get(id).cloned())
    }

    async fn delete(&self, id: &BatchId) -> Result<(), RepositoryError> {
        self.batches
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound(*id))
    }

    async fn get_current_active_batch(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<Batch>, RepositoryError> {
        let batches = self.batches.read().await;
        Ok(batches
            .values()
            .filter(|b| !b.status().is_terminal())
            .filter(|b| b.start_time() <= now && now < b.end_time())
            .max_by_key(|b| b.start_time())
            .cloned())
    }

    async fn find_by_status(&self, status: BatchStatus) -> Result<Vec<Batch>, RepositoryError> {
        let batches = self.batches.read().await;
        Ok(batches
            .values()
            .filter(|b| b.status() == status)
            .cloned()
            .collect())
    }

    async fn find_recent(&self, limit: usize) -> Result<Vec<Batch>, RepositoryError> {
        let batches = self.batches.read().await;
        let mut all: Vec<Batch> = batches.values().cloned().collect();
        all.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        all.truncate(limit);
        Ok(all)
    }

    async fn find_in_date_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Batch>, RepositoryError> {
        let batches = self.batches.read().await;
        Ok(batches
            .values()
            .filter(|b| from <= b.start_time() && b.start_time() <= to)
            .cloned()
            .collect())
    }

    async fn find_all_paginated(
        &self,
        page: usize,
        limit: usize,
        filters: BatchFilters,
    ) -> Result<Page<Batch>, RepositoryError> {
        let page = page.max(1);
        let limit = limit.max(1);

        let batches = self.batches.read().await;
        let mut matching: Vec<Batch> = batches
            .values()
            .filter(|b| Self::matches(b, &filters))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at().cmp(&a.created_at()));

        let total = matching.len();
        let pages = (total + limit - 1) / limit;
        let items = matching
            .into_iter()
            .skip((page - 1) * limit)
            .take(limit)
            .collect();

        Ok(Page {
            items,
            total,
            page,
            limit,
            pages,
        })
    }

    async fn statistics(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<BatchStatistics, RepositoryError> {
        let batches = self.batches.read().await;
        let in_range: Vec<&Batch> = batches
            .values()
            .filter(|b| from <= b.created_at() && b.created_at() <= to)
            .collect();

        let total = in_range.len() as u64;
        let completed = in_range
            .iter()
            .filter(|b| b.status() == BatchStatus::Completed)
            .count() as u64;

        let (mut commitments, mut reveal_rate) = (0.0, 0.0);
        let mut mev_extracted = U256::zero();
        let mut savings = U256::zero();
        for batch in &in_range {
            commitments += batch.commitment_count() as f64;
            reveal_rate += batch.reveal_rate();
            if let Some(metrics) = batch.metrics() {
                mev_extracted = mev_extracted.saturating_add(metrics.extracted_value);
                savings = savings.saturating_add(metrics.savings_generated);
            }
        }
        let denominator = (total as f64).max(1.0);

        Ok(BatchStatistics {
            total_batches: total,
            completed_batches: completed,
            average_commitments: commitments / denominator,
            average_reveal_rate: reveal_rate / denominator,
            total_mev_extracted: mev_extracted,
            total_savings_generated: savings,
        })
    }

    async fn exists(&self, id: &BatchId) -> Result<bool, RepositoryError> {
        Ok(self.batches.read().await.contains_key(id))
    }

    async fn count_by_status(&self, status: BatchStatus) -> Result<usize, RepositoryError> {
        let batches = self.batches.read().await;
        Ok(batches.values().filter(|b| b.status() == status).count())
    }

    async fn find_expired(&self, now: DateTime<Utc>) -> Result<Vec<Batch>, RepositoryError> {
        let batches = self.batches.read().await;
        Ok(batches
            .values()
            .filter(|b| b.is_expired(now))
            .cloned()
            .collect())
    }
}
