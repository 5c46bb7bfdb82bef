// The transaction payload hidden behind a commitment, and the record
// produced once its owner reveals it.

use chrono::{DateTime, Utc};
use primitive_types::U256;
use serde::{Deserialize, Serialize};

use super::commitment::{CommitmentHash, UserAddress};
use super::error::BatchError;
use crate::numeric::u256_dec;

/// An EVM-style transaction payload. `value` and `gas_price` travel as
/// decimal strings on the wire, `data` as `0x` hex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionData {
    pub to: UserAddress,
    #[serde(with = "u256_dec")]
    pub value: U256,
    #[serde(with = "hex_bytes")]
    pub data: Vec<u8>,
    pub gas_limit: u64,
    #[serde(with = "u256_dec")]
    pub gas_price: U256,
    pub nonce: u64,
}

impl TransactionData {
    pub fn new(
        to: UserAddress,
        value: U256,
        data: Vec<u8>,
        gas_limit: u64,
        gas_price: U256,
        nonce: u64,
    ) -> Result<Self, BatchError> {
        if gas_limit == 0 {
            return Err(BatchError::InvalidArgument("gas limit must be positive".into()));
        }
        if gas_price.is_zero() {
            return Err(BatchError::InvalidArgument("gas price must be positive".into()));
        }
        Ok(Self {
            to,
            value,
            data,
            gas_limit,
            gas_price,
            nonce,
        })
    }
}

/// A transaction whose commitment binding has been verified. Only the batch
/// aggregate constructs these, after recomputing the digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealedTransaction {
    pub commitment_hash: CommitmentHash,
    pub transaction_data: TransactionData,
    pub user_address: UserAddress,
    pub revealed_at: DateTime<Utc>,
    pub nonce: String,
}

/// Serde adapter for `0x`-prefixed hex byte strings.
pub mod hex_bytes {
    use serde::{de::Error as DeError, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let digits = raw
            .strip_prefix("0x")
            .ok_or_else(|| DeError::custom("byte string must start with 0x"))?;
        hex::decode(digits).map_err(DeError::custom)
    }
}
