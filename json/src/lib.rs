//! Insertion-ordered JSON value tree.
//!
//! RPC requests and responses are represented as a dynamically-typed [`Value`]
//! rather than serde structs: object key order is part of the wire contract
//! (insertion order is preserved through parse/serialize), and legacy callers
//! rely on "missing key reads as null" access semantics that serde cannot
//! express. Strict `Option`-returning accessors are the interface internal
//! code uses; the null-sentinel [`Value::get`]/[`Value::at`] access exists
//! for the outermost compatibility layer only.

mod parse;
mod ser;
mod value;

pub use parse::{parse, ParseError};
pub use value::Value;
