//! `account_lines`: trust lines of an account, projected from its side.

use super::{ledger_result_fields, require_account, HandlerResult};
use crate::dispatch::Context;
use crate::params;
use meridian_json::Value;
use meridian_ledger::{walk_filtered, EntryData, LineView, WalkOutcome};

pub fn account_lines(ctx: &Context, request: &Value) -> HandlerResult {
    let snap = params::resolve_ledger(ctx, request)?;
    let account = params::account_field(request, "account")?;
    require_account(&snap, &account)?;
    let peer = params::optional_account_field(request, "peer")?;
    let limit = params::limit_field(request)?;
    let resume = params::marker_field(request)?;

    let mut result = Value::object();
    result.set("account", account.to_address());

    // peer filtering participates in the walk so `limit` counts matches,
    // not scanned entries
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
            let EntryData::TrustLine(line) = &entry.data else {
                return false;
            };
            match (&peer, LineView::project(line, &account)) {
                (Some(wanted), Some(view)) => view.peer == *wanted,
                (None, Some(_)) => true,
                (_, None) => false,
            }
        })?,
    };

    let mut lines = Value::array();
    for id in &entries {
        let Some(entry) = snap.entry(id) else {
            continue;
        };
        let EntryData::TrustLine(line) = &entry.data else {
            continue;
        };
        let Some(view) = LineView::project(line, &account) else {
            continue;
        };
        let mut out = Value::object();
        out.set("account", view.peer.to_address());
        out.set("currency", view.currency.as_str());
        out.set("balance", view.balance);
        out.set("limit", view.limit);
        out.set("limit_peer", view.limit_peer);
        out.set("no_ripple", view.no_ripple);
        out.set("no_ripple_peer", view.no_ripple_peer);
        out.set("freeze", view.freeze);
        out.set("freeze_peer", view.freeze_peer);
        out.set("authorized", view.authorized);
        out.set("peer_authorized", view.peer_authorized);
        lines.push(out);
    }
    result.set("lines", lines);
    result.set("limit", limit as u64);
    if let Some(marker) = marker {
        result.set("marker", marker.to_string());
    }
    ledger_result_fields(ctx, &snap, &mut result);
    Ok(result)
}
