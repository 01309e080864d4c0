//! Ledger header methods and the admin-only close trigger.

use super::HandlerResult;
use crate::dispatch::Context;
use crate::params;
use meridian_json::Value;
use meridian_ledger::LedgerSpec;

/// Header summary of one resolved ledger.
pub fn ledger(ctx: &Context, request: &Value) -> HandlerResult {
    let snap = params::resolve_ledger(ctx, request)?;
    let header = snap.header();

    let mut inner = Value::object();
    inner.set("ledger_index", header.seq);
    inner.set("ledger_hash", header.hash.to_hex());
    inner.set("parent_hash", header.parent.to_hex());
    inner.set("close_time", header.close_time);

    let mut result = Value::object();
    result.set("ledger", inner);
    result.set("ledger_index", header.seq);
    result.set("ledger_hash", header.hash.to_hex());
    result.set("validated", ctx.ledgers.is_validated(header.seq));
    Ok(result)
}

/// Index of the in-progress ledger.
pub fn ledger_current(ctx: &Context, _request: &Value) -> HandlerResult {
    let snap = ctx.ledgers.resolve(&LedgerSpec::Current)?;
    let mut result = Value::object();
    result.set("ledger_current_index", snap.seq());
    Ok(result)
}

/// Identity of the most recently closed ledger.
pub fn ledger_closed(ctx: &Context, _request: &Value) -> HandlerResult {
    let snap = ctx.ledgers.resolve(&LedgerSpec::Closed)?;
    let mut result = Value::object();
    result.set("ledger_hash", snap.hash().to_hex());
    result.set("ledger_index", snap.seq());
    Ok(result)
}

/// Node status: retained range and role indexes.
pub fn server_state(ctx: &Context, _request: &Value) -> HandlerResult {
    let mut state = Value::object();
    state.set(
        "complete_ledgers",
        match ctx.ledgers.retained_range() {
            Some((first, last)) => format!("{first}-{last}"),
            None => "empty".to_owned(),
        },
    );
    if let Some(seq) = ctx.ledgers.current_seq() {
        state.set("ledger_current_index", seq);
    }
    if let Some(seq) = ctx.ledgers.closed_seq() {
        state.set("closed_ledger_index", seq);
    }
    if let Some(seq) = ctx.ledgers.validated_seq() {
        state.set("validated_ledger_index", seq);
    }
    let mut result = Value::object();
    result.set("state", state);
    Ok(result)
}

/// Close the current ledger and open its successor. Admin only; in a
/// standalone node this stands in for consensus.
pub fn ledger_accept(ctx: &Context, _request: &Value) -> HandlerResult {
    let closing = ctx.ledgers.resolve(&LedgerSpec::Current)?;
    let next = closing.advance(closing.header().close_time + 10);
    let next_seq = next.seq();
    ctx.ledgers.publish_current(next);
    ctx.ledgers.mark_closed(closing.seq());
    ctx.ledgers.mark_validated(closing.seq());

    let mut result = Value::object();
    result.set("ledger_current_index", next_seq);
    Ok(result)
}
