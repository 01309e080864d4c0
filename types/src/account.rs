//! Account identifiers and the checksummed `mrd_` address codec.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A 20-byte account identifier.
///
/// The wire form is a checksummed address: `mrd_` + 40 hex characters of the
/// id + 8 hex characters of checksum (first four bytes of Blake2b-256 over
/// the raw id). The checksum makes transposed or truncated addresses fail
/// loudly instead of resolving to the wrong account.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId([u8; 20]);

/// Error parsing an account address.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("address must start with {}", AccountId::PREFIX)]
    BadPrefix,

    #[error("address has wrong length")]
    BadLength,

    #[error("address contains invalid hex")]
    BadHex,

    #[error("address checksum mismatch")]
    BadChecksum,
}

impl AccountId {
    /// The standard prefix for all Meridian addresses.
    pub const PREFIX: &'static str = "mrd_";

    /// Total length of a rendered address: prefix + 40 id chars + 8 checksum.
    const ADDRESS_LEN: usize = 4 + 40 + 8;

    pub fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Render the checksummed address string.
    pub fn to_address(&self) -> String {
        let mut s = String::with_capacity(Self::ADDRESS_LEN);
        s.push_str(Self::PREFIX);
        s.push_str(&hex::encode(self.0));
        s.push_str(&hex::encode(&checksum(&self.0)[..4]));
        s
    }
}

fn checksum(id: &[u8; 20]) -> [u8; 32] {
    let mut hasher = Blake2b::<U32>::new();
    hasher.update(id);
    let out = hasher.finalize();
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&out);
    bytes
}

impl FromStr for AccountId {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s.strip_prefix(Self::PREFIX).ok_or(AddressError::BadPrefix)?;
        if body.len() != 48 {
            return Err(AddressError::BadLength);
        }
        let (id_part, check_part) = body.split_at(40);
        let mut id = [0u8; 20];
        hex::decode_to_slice(id_part, &mut id).map_err(|_| AddressError::BadHex)?;
        let mut check = [0u8; 4];
        hex::decode_to_slice(check_part, &mut check).map_err(|_| AddressError::BadHex)?;
        if check != checksum(&id)[..4] {
            return Err(AddressError::BadChecksum);
        }
        Ok(Self(id))
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_address())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_roundtrip() {
        let id = AccountId::new([7u8; 20]);
        let addr = id.to_address();
        assert!(addr.starts_with("mrd_"));
        let parsed: AccountId = addr.parse().expect("parse");
        assert_eq!(id, parsed);
    }

    #[test]
    fn rejects_missing_prefix() {
        let addr = AccountId::new([1u8; 20]).to_address();
        let stripped = &addr[4..];
        assert_eq!(stripped.parse::<AccountId>(), Err(AddressError::BadPrefix));
    }

    #[test]
    fn rejects_truncated_address() {
        let mut addr = AccountId::new([1u8; 20]).to_address();
        addr.pop();
        assert_eq!(addr.parse::<AccountId>(), Err(AddressError::BadLength));
    }

    #[test]
    fn rejects_corrupted_checksum() {
        let addr = AccountId::new([1u8; 20]).to_address();
        let mut chars: Vec<char> = addr.chars().collect();
        let last = chars.len() - 1;
        chars[last] = if chars[last] == '0' { '1' } else { '0' };
        let corrupted: String = chars.into_iter().collect();
        assert_eq!(corrupted.parse::<AccountId>(), Err(AddressError::BadChecksum));
    }

    #[test]
    fn rejects_non_hex_body() {
        let addr = format!("mrd_{}", "g".repeat(48));
        assert_eq!(addr.parse::<AccountId>(), Err(AddressError::BadHex));
    }
}
