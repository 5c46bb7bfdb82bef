// 256-bit wei arithmetic and the decimal string form used on the wire.

use primitive_types::U256;

/// 10^18 wei per ether.
pub const WEI_PER_ETH: u64 = 1_000_000_000_000_000_000;

/// Convert whole ether to wei. Returns `None` on overflow of the 256-bit
/// range (amounts above ~1.15e59 ether).
pub fn eth_to_wei(eth: U256) -> Option<U256> {
    eth.checked_mul(U256::from(WEI_PER_ETH))
}

/// Convert wei to whole ether, truncating any sub-ether remainder.
pub fn wei_to_eth(wei: U256) -> U256 {
    wei / U256::from(WEI_PER_ETH)
}

/// Parse a non-negative 256-bit integer from its decimal string form.
pub fn parse_u256(s: &str) -> Result<U256, String> {
    if s.is_empty() {
        return Err("empty decimal string".into());
    }
    U256::from_dec_str(s).map_err(|e| format!("invalid decimal string '{}': {:?}", s, e))
}

/// Serde adapter storing a `U256` as a decimal string.
pub mod u256_dec {
    use primitive_types::U256;
    use serde::{de::Error as DeError, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_u256(&raw).map_err(DeError::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eth_wei_round_trip() {
        for raw in [0u64, 1, 42, 1_000_000] {
            let eth = U256::from(raw);
            let wei = eth_to_wei(eth).expect("no overflow for small amounts");
            assert_eq!(wei_to_eth(wei), eth);
        }
    }

    #[test]
    fn eth_to_wei_overflows_near_the_top_of_the_range() {
        assert!(eth_to_wei(U256::MAX).is_none());
    }

    #[test]
    fn wei_to_eth_truncates_remainders() {
        let one_eth_and_change = U256::from(WEI_PER_ETH) + U256::from(7u64);
        assert_eq!(wei_to_eth(one_eth_and_change), U256::one());
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(parse_u256("").is_err());
        assert!(parse_u256("0x10").is_err());
        assert!(parse_u256("-1").is_err());
        assert_eq!(parse_u256("1000").unwrap(), U256::from(1000u64));
    }
}
