//! 256-bit identifiers for ledger headers, entries and directory pages.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A 256-bit identifier.
///
/// Used for ledger hashes, ledger entry keys and directory page ids. The
/// textual form is 64 lowercase hex characters.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Hash256([u8; 32]);

/// Error parsing a `Hash256` from its textual form.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HashParseError {
    #[error("expected 64 hex characters, got {0}")]
    BadLength(usize),

    #[error("invalid hex")]
    BadHex,
}

impl Hash256 {
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Render as 64 lowercase hex characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl FromStr for Hash256 {
    type Err = HashParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 64 {
            return Err(HashParseError::BadLength(s.len()));
        }
        let mut out = [0u8; 32];
        hex::decode_to_slice(s, &mut out).map_err(|_| HashParseError::BadHex)?;
        Ok(Self(out))
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash256({})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_roundtrip() {
        let h = Hash256::new([0xAB; 32]);
        let parsed: Hash256 = h.to_hex().parse().expect("parse");
        assert_eq!(h, parsed);
    }

    #[test]
    fn rejects_bad_length() {
        assert_eq!("abcd".parse::<Hash256>(), Err(HashParseError::BadLength(4)));
    }

    #[test]
    fn rejects_non_hex() {
        let s = "zz".repeat(32);
        assert_eq!(s.parse::<Hash256>(), Err(HashParseError::BadHex));
    }
}
