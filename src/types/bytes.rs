//! Fixed-size hash type
//!
//! Coin ids, puzzle hashes and merkle roots are all 32-byte sha256 digests.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// 32-byte hash (coin id, puzzle hash, merkle root)
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Bytes32(pub [u8; 32]);

impl Bytes32 {
    pub const ZERO: Bytes32 = Bytes32([0u8; 32]);

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Build from a slice, returning None unless it is exactly 32 bytes
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let arr: [u8; 32] = bytes.try_into().ok()?;
        Some(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl AsRef<[u8]> for Bytes32 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Bytes32 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Bytes32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Bytes32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bytes32({})", self.to_hex())
    }
}

impl FromStr for Bytes32 {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches("0x");
        let bytes = hex::decode(trimmed).map_err(|e| format!("invalid hex: {}", e))?;
        Self::from_slice(&bytes).ok_or_else(|| format!("expected 32 bytes, got {}", bytes.len()))
    }
}

impl Serialize for Bytes32 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Bytes32 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// SHA256 over the concatenation of `parts`
pub fn sha256(parts: &[&[u8]]) -> Bytes32 {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    Bytes32(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_parsing() {
        let hash = Bytes32([0xab; 32]);
        let parsed: Bytes32 = hash.to_hex().parse().unwrap();
        assert_eq!(parsed, hash);

        let prefixed: Bytes32 = format!("0x{}", hash.to_hex()).parse().unwrap();
        assert_eq!(prefixed, hash);

        assert!("abcd".parse::<Bytes32>().is_err());
        assert!("zz".parse::<Bytes32>().is_err());
    }

    #[test]
    fn test_from_slice_length() {
        assert!(Bytes32::from_slice(&[1u8; 31]).is_none());
        assert!(Bytes32::from_slice(&[1u8; 33]).is_none());
        assert_eq!(Bytes32::from_slice(&[1u8; 32]), Some(Bytes32([1u8; 32])));
    }

    #[test]
    fn test_json_is_hex_string() {
        let json = serde_json::to_string(&Bytes32([0x01; 32])).unwrap();
        assert_eq!(json, format!("\"{}\"", "01".repeat(32)));
    }
}
