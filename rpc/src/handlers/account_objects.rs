//! `account_objects`: paginated enumeration of everything an account owns.

use super::{entry_json, ledger_result_fields, require_account, HandlerResult};
use crate::dispatch::Context;
use crate::params;
use meridian_json::Value;
use meridian_ledger::{walk_filtered, EntryType, WalkOutcome};

pub fn account_objects(ctx: &Context, request: &Value) -> HandlerResult {
    let snap = params::resolve_ledger(ctx, request)?;
    let account = params::account_field(request, "account")?;
    require_account(&snap, &account)?;
    let filter = params::type_filter_field(request)?;
    let blockers_only = params::bool_field(request, "deletion_blockers_only")?;
    let limit = params::limit_field(request)?;
    let resume = params::marker_field(request)?;

    let mut result = Value::object();
    result.set("account", account.to_address());

    // NFT pages fold into one present/absent group when restricting to
    // deletion blockers: the first page counts, the rest are skipped
    let mut nft_seen = false;
    let WalkOutcome {
        entries, marker, ..
    } = match snap.owner_dir(&account) {
        // accounts owning nothing get the same response shape
        None => WalkOutcome {
            entries: Vec::new(),
            marker: None,
            scanned: 0,
        },
        Some(dir) => walk_filtered(dir, resume, limit, |id| {
            let Some(entry) = snap.entry(id) else {
                return false;
            };
            let ty = entry.entry_type();
            if let Some(wanted) = filter {
                if ty != wanted {
                    return false;
                }
            }
            if blockers_only {
                if !ty.is_deletion_blocker() {
                    return false;
                }
                if ty == EntryType::NftPage {
                    if nft_seen {
                        return false;
                    }
                    nft_seen = true;
                }
            }
            true
        })?,
    };

    let mut objects = Value::array();
    for id in &entries {
        if let Some(entry) = snap.entry(id) {
            objects.push(entry_json(entry));
        }
    }
    result.set("account_objects", objects);
    result.set("limit", limit as u64);
    if let Some(marker) = marker {
        result.set("marker", marker.to_string());
    }
    ledger_result_fields(ctx, &snap, &mut result);
    Ok(result)
}
