//! Common parameter extraction.
//!
//! All validation is fail-fast: a request with a bad field is rejected
//! before any ledger lookup happens. Unknown top-level parameters are
//! ignored for forward compatibility.

use crate::dispatch::Context;
use crate::error::{ErrorKind, ErrorObject};
use meridian_json::Value;
use meridian_ledger::{Amount, EntryType, LedgerSnapshot, LedgerSpec, Marker, Resume};
use meridian_types::AccountId;
use std::str::FromStr;
use std::sync::Arc;

/// Page size when `limit` is absent.
pub const DEFAULT_LIMIT: usize = 200;

/// Hard cap; larger requested limits are clamped, not rejected.
pub const MAX_LIMIT: usize = 400;

/// Required checksummed account address.
pub fn account_field(params: &Value, field: &str) -> Result<AccountId, ErrorObject> {
    if !params.contains(field) {
        return Err(ErrorObject::missing_field(field));
    }
    let raw = params
        .get(field)
        .as_str()
        .ok_or_else(|| ErrorObject::type_mismatch(field))?;
    raw.parse().map_err(|_| ErrorObject::invalid_field(field))
}

/// Optional checksummed account address.
pub fn optional_account_field(params: &Value, field: &str) -> Result<Option<AccountId>, ErrorObject> {
    if !params.contains(field) {
        return Ok(None);
    }
    account_field(params, field).map(Some)
}

/// `limit`: positive unsigned integer; absent means the server default;
/// oversized values clamp to [`MAX_LIMIT`].
pub fn limit_field(params: &Value) -> Result<usize, ErrorObject> {
    if !params.contains("limit") {
        return Ok(DEFAULT_LIMIT);
    }
    match params.get("limit").as_u64() {
        Some(n) if n > 0 => Ok((n as usize).min(MAX_LIMIT)),
        // zero, negative, double, string: all type errors
        _ => Err(ErrorObject::type_mismatch("limit")),
    }
}

/// `type`: one of the fixed entry-type tokens.
pub fn type_filter_field(params: &Value) -> Result<Option<EntryType>, ErrorObject> {
    if !params.contains("type") {
        return Ok(None);
    }
    let token = params
        .get("type")
        .as_str()
        .ok_or_else(|| ErrorObject::type_mismatch("type"))?;
    EntryType::from_token(token)
        .map(Some)
        .ok_or_else(|| ErrorObject::invalid_field("type"))
}

/// Optional boolean, strict about type when present.
pub fn bool_field(params: &Value, field: &str) -> Result<bool, ErrorObject> {
    if !params.contains(field) {
        return Ok(false);
    }
    params
        .get(field)
        .as_bool()
        .ok_or_else(|| ErrorObject::type_mismatch(field))
}

/// Optional marker, parsed leniently (the truncated-offset compatibility
/// path is accepted here; see `Marker::parse_lenient`).
pub fn marker_field(params: &Value) -> Result<Option<Resume>, ErrorObject> {
    if !params.contains("marker") {
        return Ok(None);
    }
    let raw = params
        .get("marker")
        .as_str()
        .ok_or_else(|| ErrorObject::type_mismatch("marker"))?;
    // syntactic defects map to "Invalid field 'marker'."; staleness is only
    // discoverable later, against the directory
    Ok(Some(Marker::parse_lenient(raw)?))
}

/// Optional marker for walkers that do not carry the legacy lenient path.
pub fn strict_marker_field(params: &Value) -> Result<Option<Marker>, ErrorObject> {
    if !params.contains("marker") {
        return Ok(None);
    }
    let raw = params
        .get("marker")
        .as_str()
        .ok_or_else(|| ErrorObject::type_mismatch("marker"))?;
    Ok(Some(Marker::parse_strict(raw)?))
}

/// Build the ledger specifier from `ledger_hash`/`ledger_index`.
///
/// When both are supplied, the hash wins over the index. This is
/// long-standing wire behavior that integrators depend on; keep it.
pub fn ledger_spec_from(params: &Value) -> Result<LedgerSpec, ErrorObject> {
    if params.contains("ledger_hash") {
        let raw = params
            .get("ledger_hash")
            .as_str()
            .ok_or_else(|| ErrorObject::type_mismatch("ledger_hash"))?;
        let hash = meridian_types::Hash256::from_str(raw)
            .map_err(|_| ErrorObject::invalid_field("ledger_hash"))?;
        return Ok(LedgerSpec::Hash(hash));
    }
    if params.contains("ledger_index") {
        return match params.get("ledger_index") {
            Value::String(alias) => match alias.as_str() {
                "current" => Ok(LedgerSpec::Current),
                "closed" => Ok(LedgerSpec::Closed),
                "validated" => Ok(LedgerSpec::Validated),
                _ => Err(ErrorObject::invalid_field("ledger_index")),
            },
            Value::Int(n) if *n <= 0 => {
                Err(ErrorObject::new(ErrorKind::LedgerIndexTooSmall))
            }
            value => match value.as_u32() {
                Some(0) => Err(ErrorObject::new(ErrorKind::LedgerIndexTooSmall)),
                Some(seq) => Ok(LedgerSpec::Seq(seq)),
                None => match value.as_u64() {
                    // positive but beyond u32: past any possible ledger
                    Some(_) => Err(ErrorObject::new(ErrorKind::LedgerIndexTooLarge)),
                    None => Err(ErrorObject::type_mismatch("ledger_index")),
                },
            },
        };
    }
    Ok(LedgerSpec::Current)
}

/// Resolve the request's target snapshot.
pub fn resolve_ledger(ctx: &Context, params: &Value) -> Result<Arc<LedgerSnapshot>, ErrorObject> {
    let spec = ledger_spec_from(params)?;
    Ok(ctx.ledgers.resolve(&spec)?)
}

/// An asset specifier for book lookups: `{"currency": "...", "issuer"?: "..."}`.
pub fn asset_field(params: &Value, field: &str) -> Result<Amount, ErrorObject> {
    if !params.contains(field) {
        return Err(ErrorObject::missing_field(field));
    }
    let spec = params.get(field);
    if !spec.is_object() {
        return Err(ErrorObject::type_mismatch(field));
    }
    let currency = spec
        .get("currency")
        .as_str()
        .ok_or_else(|| ErrorObject::invalid_field(field))?;
    if currency.is_empty() {
        return Err(ErrorObject::invalid_field(field));
    }
    let issuer = if spec.contains("issuer") {
        let raw = spec
            .get("issuer")
            .as_str()
            .ok_or_else(|| ErrorObject::invalid_field(field))?;
        Some(
            raw.parse::<AccountId>()
                .map_err(|_| ErrorObject::invalid_field(field))?,
        )
    } else {
        None
    };
    Ok(Amount {
        currency: currency.to_owned(),
        issuer,
        value: "0".to_owned(),
    })
}
