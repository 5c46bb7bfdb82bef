// Identifiers and the commitment record. All of these are immutable value
// objects; constructors reject malformed input so an instance is valid by
// construction.

use chrono::{DateTime, Utc};
use serde::de::Error as SerdeError;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

use super::error::BatchError;

pub const COMMITMENT_HASH_SIZE: usize = 32;
pub const ADDRESS_SIZE: usize = 20;

/// Off-chain nonces shorter than this are trivially brute-forceable against
/// a known transaction payload.
pub const MIN_NONCE_LEN: usize = 10;

/// Unique identifier of a batch auction round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(Uuid);

impl BatchId {
    pub fn new() -> Self {
        BatchId(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for BatchId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BatchId {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(BatchId).map_err(|_| "invalid batch id")
    }
}

/// 32-byte SHA-256 commitment digest. The wire form is `0x` followed by 64
/// hex digits (66 characters total).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommitmentHash([u8; COMMITMENT_HASH_SIZE]);

impl CommitmentHash {
    pub const fn new(bytes: [u8; COMMITMENT_HASH_SIZE]) -> Self {
        CommitmentHash(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; COMMITMENT_HASH_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl Display for CommitmentHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for CommitmentHash {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .ok_or("commitment hash must start with 0x")?;
        if digits.len() != COMMITMENT_HASH_SIZE * 2 {
            return Err("commitment hash must be 32 bytes of hex");
        }
        let bytes = hex::decode(digits).map_err(|_| "commitment hash is not valid hex")?;
        let bytes: [u8; COMMITMENT_HASH_SIZE] =
            bytes.try_into().map_err(|_| "commitment hash must be 32 bytes of hex")?;
        Ok(CommitmentHash(bytes))
    }
}

impl Serialize for CommitmentHash {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for CommitmentHash {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(SerdeError::custom)
    }
}

/// 20-byte EVM account address. Parsing is case-insensitive; the display
/// form is lowercase `0x` hex. Only syntactic validity is checked here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserAddress([u8; ADDRESS_SIZE]);

impl UserAddress {
    pub const fn new(bytes: [u8; ADDRESS_SIZE]) -> Self {
        UserAddress(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl Display for UserAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for UserAddress {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").ok_or("address must start with 0x")?;
        if digits.len() != ADDRESS_SIZE * 2 {
            return Err("address must be 20 bytes of hex");
        }
        let bytes = hex::decode(digits).map_err(|_| "address is not valid hex")?;
        let bytes: [u8; ADDRESS_SIZE] =
            bytes.try_into().map_err(|_| "address must be 20 bytes of hex")?;
        Ok(UserAddress(bytes))
    }
}

impl Serialize for UserAddress {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for UserAddress {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(SerdeError::custom)
    }
}

/// A user's binding, content-hiding pledge for one transaction in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commitment {
    pub hash: CommitmentHash,
    pub user_address: UserAddress,
    pub timestamp: DateTime<Utc>,
    pub nonce: Option<String>,
}

impl Commitment {
    /// Build a commitment record, rejecting future timestamps and
    /// undersized nonces.
    pub fn new(
        hash: CommitmentHash,
        user_address: UserAddress,
        timestamp: DateTime<Utc>,
        nonce: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, BatchError> {
        if timestamp > now {
            return Err(BatchError::InvalidCommitment(
                "commitment timestamp lies in the future".into(),
            ));
        }
        if let Some(nonce) = &nonce {
            if nonce.len() < MIN_NONCE_LEN {
                return Err(BatchError::InvalidCommitment(format!(
                    "nonce must be at least {} characters, got {}",
                    MIN_NONCE_LEN,
                    nonce.len()
                )));
            }
        }
        Ok(Self {
            hash,
            user_address,
            timestamp,
            nonce,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some_hash() -> CommitmentHash {
        CommitmentHash::new([0xab; 32])
    }

    fn some_address() -> UserAddress {
        UserAddress::new([0x11; 20])
    }

    #[test]
    fn commitment_hash_wire_form_is_66_chars() {
        let hash = some_hash();
        let hex = hash.to_hex();
        assert_eq!(hex.len(), 66);
        assert_eq!(hex.parse::<CommitmentHash>().unwrap(), hash);
    }

    #[test]
    fn commitment_hash_rejects_malformed_input() {
        assert!("abab".parse::<CommitmentHash>().is_err());
        assert!("0xabab".parse::<CommitmentHash>().is_err());
        let no_prefix = "ab".repeat(32);
        assert!(no_prefix.parse::<CommitmentHash>().is_err());
        let bad_digit = format!("0xzz{}", "ab".repeat(31));
        assert!(bad_digit.parse::<CommitmentHash>().is_err());
    }

    #[test]
    fn address_parse_is_case_insensitive() {
        let mixed = "0xAbCdEf0123456789aBcDeF0123456789abcdef01";
        let addr: UserAddress = mixed.parse().unwrap();
        assert_eq!(addr.to_hex(), mixed.to_lowercase());
    }

    #[test]
    fn commitment_rejects_future_timestamp() {
        let now = Utc::now();
        let err = Commitment::new(
            some_hash(),
            some_address(),
            now + chrono::Duration::seconds(5),
            None,
            now,
        )
        .unwrap_err();
        assert_eq!(err.code(), "INVALID_COMMITMENT");
    }

    #[test]
    fn commitment_rejects_short_nonce() {
        let now = Utc::now();
        let err = Commitment::new(
            some_hash(),
            some_address(),
            now,
            Some("short".into()),
            now,
        )
        .unwrap_err();
        assert_eq!(err.code(), "INVALID_COMMITMENT");

        assert!(Commitment::new(
            some_hash(),
            some_address(),
            now,
            Some("abcdef1234".into()),
            now
        )
        .is_ok());
    }

    #[test]
    fn batch_id_round_trips_through_display() {
        let id = BatchId::new();
        assert_eq!(id.to_string().parse::<BatchId>().unwrap(), id);
    }
}
