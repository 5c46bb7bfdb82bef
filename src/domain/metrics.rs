// Aggregate MEV accounting attached to a finalized batch.

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use super::error::BatchError;
use crate::numeric::u256_dec;

/// Wei amounts plus execution counters for one completed batch. U256 fields
/// are non-negative by type; the only cross-field invariant is that no more
/// transactions succeeded than were executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MevMetrics {
    #[serde(with = "u256_dec")]
    pub extracted_value: U256,
    #[serde(with = "u256_dec")]
    pub savings_generated: U256,
    pub total_transactions: u64,
    pub successful_transactions: u64,
    #[serde(with = "u256_dec")]
    pub average_gas_price: U256,
    #[serde(with = "u256_dec")]
    pub total_gas_used: U256,
}

impl MevMetrics {
    pub fn new(
        extracted_value: U256,
        savings_generated: U256,
        total_transactions: u64,
        successful_transactions: u64,
        average_gas_price: U256,
        total_gas_used: U256,
    ) -> Result<Self, BatchError> {
        if successful_transactions > total_transactions {
            return Err(BatchError::InvalidArgument(format!(
                "successful transactions ({}) exceed total transactions ({})",
                successful_transactions, total_transactions
            )));
        }
        Ok(Self {
            extracted_value,
            savings_generated,
            total_transactions,
            successful_transactions,
            average_gas_price,
            total_gas_used,
        })
    }

    /// All-zero metrics for a batch that executed nothing.
    pub fn empty() -> Self {
        Self {
            extracted_value: U256::zero(),
            savings_generated: U256::zero(),
            total_transactions: 0,
            successful_transactions: 0,
            average_gas_price: U256::zero(),
            total_gas_used: U256::zero(),
        }
    }
}
