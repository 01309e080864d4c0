//! Fundamental types shared across Meridian crates.

pub mod account;
pub mod hash;

pub use account::{AccountId, AddressError};
pub use hash::{Hash256, HashParseError};

/// Ledger sequence number.
pub type LedgerSeq = u32;
