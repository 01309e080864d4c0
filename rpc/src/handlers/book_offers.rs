//! `book_offers`: price-ordered walk of one order book.
//!
//! Frozen offers stay visible (auditability); execution-side rejection of
//! crossing against them happens elsewhere.

use super::{amount_json, ledger_result_fields, HandlerResult};
use crate::dispatch::Context;
use crate::params;
use meridian_json::Value;
use meridian_ledger::{book_id, walk_filtered, Amount, EntryData, LedgerSnapshot, Offer, Resume, WalkOutcome};

pub fn book_offers(ctx: &Context, request: &Value) -> HandlerResult {
    let snap = params::resolve_ledger(ctx, request)?;
    let taker_pays = params::asset_field(request, "taker_pays")?;
    let taker_gets = params::asset_field(request, "taker_gets")?;
    let limit = params::limit_field(request)?;
    // the book walker has no legacy lenient path: truncated markers are
    // malformed here
    let marker = params::strict_marker_field(request)?;

    let book = book_id(&taker_pays, &taker_gets);
    let mut result = Value::object();

    let WalkOutcome {
        entries, marker, ..
    } = match snap.book_dir(&book) {
        // books with no offers get the same response shape
        None => WalkOutcome {
            entries: Vec::new(),
            marker: None,
            scanned: 0,
        },
        Some(dir) => walk_filtered(dir, marker.map(Resume::At), limit, |id| {
            matches!(snap.entry(id).map(|e| &e.data), Some(EntryData::Offer(_)))
        })?,
    };

    let mut offers = Value::array();
    for id in &entries {
        let Some(entry) = snap.entry(id) else {
            continue;
        };
        let EntryData::Offer(offer) = &entry.data else {
            continue;
        };
        let mut out = Value::object();
        out.set("index", entry.id.to_hex());
        out.set("owner", offer.owner.to_address());
        out.set("sequence", offer.sequence);
        out.set("taker_pays", amount_json(&offer.taker_pays));
        out.set("taker_gets", amount_json(&offer.taker_gets));
        out.set("quality", offer.quality);
        out.set("frozen", offer_frozen(&snap, offer));
        offers.push(out);
    }
    result.set("offers", offers);
    result.set("limit", limit as u64);
    if let Some(marker) = marker {
        result.set("marker", marker.to_string());
    }
    ledger_result_fields(ctx, &snap, &mut result);
    Ok(result)
}

/// An offer is frozen when either traded asset's issuer has global freeze
/// set, or the owner's trust line to that issuer is frozen.
fn offer_frozen(snap: &LedgerSnapshot, offer: &Offer) -> bool {
    side_frozen(snap, offer, &offer.taker_gets) || side_frozen(snap, offer, &offer.taker_pays)
}

fn side_frozen(snap: &LedgerSnapshot, offer: &Offer, asset: &Amount) -> bool {
    let Some(issuer) = &asset.issuer else {
        // native asset has no issuer and cannot freeze
        return false;
    };
    snap.global_freeze(issuer) || snap.line_frozen(&offer.owner, issuer, &asset.currency)
}
