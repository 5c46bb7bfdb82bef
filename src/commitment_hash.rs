// Commitment digests. The coordinator and every client must agree on this
// encoding byte-for-byte; it is the root of the binding guarantee.

use rand::Rng;
use sha2::{Digest, Sha256};

use crate::domain::commitment::CommitmentHash;
use crate::domain::transaction::TransactionData;

/// Canonical byte encoding of a payload: colon-separated ASCII fields in the
/// fixed order to, value, data, gas limit, gas price, nonce. Addresses and
/// data are lowercase `0x` hex, numbers decimal. No field can contain a
/// colon, so the encoding is injective.
pub fn canonical_encoding(tx: &TransactionData) -> Vec<u8> {
    format!(
        "{}:{}:0x{}:{}:{}:{}",
        tx.to.to_hex(),
        tx.value,
        hex::encode(&tx.data),
        tx.gas_limit,
        tx.gas_price,
        tx.nonce
    )
    .into_bytes()
}

/// SHA-256 over the canonical payload encoding concatenated with the
/// client's nonce string.
pub fn commitment_hash_of(tx: &TransactionData, nonce: &str) -> CommitmentHash {
    let mut hasher = Sha256::new();
    hasher.update(canonical_encoding(tx));
    hasher.update(nonce.as_bytes());
    CommitmentHash::new(hasher.finalize().into())
}

/// Recompute the digest and compare against a stored commitment.
pub fn verify(expected: &CommitmentHash, tx: &TransactionData, nonce: &str) -> bool {
    commitment_hash_of(tx, nonce) == *expected
}

/// 32-bit rolling hash over the same input, rendered as 8 hex chars.
/// Development tooling only (log correlation, fixtures); trivially
/// collidable, never a substitute for [`commitment_hash_of`] against
/// adversarial users.
pub fn fast_hash(tx: &TransactionData, nonce: &str) -> String {
    let mut h: u32 = 0;
    for byte in canonical_encoding(tx).iter().chain(nonce.as_bytes()) {
        h = h.wrapping_mul(31).wrapping_add(u32::from(*byte));
    }
    format!("{:08x}", h)
}

/// Random alphanumeric nonce for client tooling, comfortably above the
/// minimum accepted length.
pub fn generate_nonce() -> String {
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    (0..16)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::commitment::MIN_NONCE_LEN;
    use primitive_types::U256;

    fn sample_tx() -> TransactionData {
        TransactionData::new(
            "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb".parse().unwrap(),
            U256::from(1000u64),
            vec![],
            21_000,
            U256::from(1_000_000_000u64),
            0,
        )
        .unwrap()
    }

    #[test]
    fn digest_is_deterministic() {
        let tx = sample_tx();
        assert_eq!(
            commitment_hash_of(&tx, "abcdef1234"),
            commitment_hash_of(&tx, "abcdef1234")
        );
    }

    #[test]
    fn verify_accepts_the_committed_pair_only() {
        let tx = sample_tx();
        let hash = commitment_hash_of(&tx, "abcdef1234");
        assert!(verify(&hash, &tx, "abcdef1234"));
        assert!(!verify(&hash, &tx, "wrongwrongw"));

        let mut other = tx.clone();
        other.nonce = 1;
        assert!(!verify(&hash, &other, "abcdef1234"));
    }

    #[test]
    fn encoding_separates_adjacent_fields() {
        // "12" + data "34" must not collide with "1" + data "234".
        let a = TransactionData::new(
            sample_tx().to,
            U256::from(12u64),
            vec![0x34],
            21_000,
            U256::from(1u64),
            0,
        )
        .unwrap();
        let b = TransactionData::new(
            sample_tx().to,
            U256::from(1u64),
            vec![0x23, 0x40],
            21_000,
            U256::from(1u64),
            0,
        )
        .unwrap();
        assert_ne!(canonical_encoding(&a), canonical_encoding(&b));
        assert_ne!(
            commitment_hash_of(&a, "abcdef1234"),
            commitment_hash_of(&b, "abcdef1234")
        );
    }

    #[test]
    fn fast_hash_is_eight_hex_chars() {
        let tx = sample_tx();
        let h = fast_hash(&tx, "abcdef1234");
        assert_eq!(h.len(), 8);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(h, fast_hash(&tx, "abcdef1234"));
    }

    #[test]
    fn generated_nonces_are_long_enough() {
        let nonce = generate_nonce();
        assert!(nonce.len() >= MIN_NONCE_LEN);
        assert_ne!(generate_nonce(), generate_nonce());
    }
}
