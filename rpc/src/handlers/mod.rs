//! RPC method handlers.

mod account_lines;
mod account_objects;
mod book_offers;
mod ledger;

pub use account_lines::account_lines;
pub use account_objects::account_objects;
pub use book_offers::book_offers;
pub use ledger::{ledger, ledger_accept, ledger_closed, ledger_current, server_state};

use crate::dispatch::Context;
use crate::error::{ErrorKind, ErrorObject};
use meridian_json::Value;
use meridian_ledger::{Amount, EntryData, LedgerEntry, LedgerSnapshot};
use meridian_types::AccountId;

/// Result payload of a handler, before envelope wrapping.
pub type HandlerResult = Result<Value, ErrorObject>;

/// Attach the standard ledger identification fields to a result.
pub(crate) fn ledger_result_fields(ctx: &Context, snap: &LedgerSnapshot, result: &mut Value) {
    result.set("ledger_index", snap.seq());
    result.set("ledger_hash", snap.hash().to_hex());
    result.set("validated", ctx.ledgers.is_validated(snap.seq()));
}

/// Reject requests against accounts the snapshot has never seen.
pub(crate) fn require_account(
    snap: &LedgerSnapshot,
    account: &AccountId,
) -> Result<(), ErrorObject> {
    if snap.account(account).is_some() || snap.owner_dir(account).is_some() {
        Ok(())
    } else {
        Err(ErrorObject::with_message(
            ErrorKind::EntityNotFound,
            "Account not found.",
        ))
    }
}

pub(crate) fn amount_json(amount: &Amount) -> Value {
    let mut out = Value::object();
    out.set("currency", amount.currency.as_str());
    if let Some(issuer) = &amount.issuer {
        out.set("issuer", issuer.to_address());
    }
    out.set("value", amount.value.as_str());
    out
}

/// Render a ledger entry for `account_objects` output.
pub(crate) fn entry_json(entry: &LedgerEntry) -> Value {
    let mut out = Value::object();
    out.set("index", entry.id.to_hex());
    out.set("type", entry.entry_type().token());
    match &entry.data {
        EntryData::TrustLine(line) => {
            out.set("low", line.low.to_address());
            out.set("high", line.high.to_address());
            out.set("currency", line.currency.as_str());
            out.set("balance", line.balance);
            out.set("low_limit", line.low_limit);
            out.set("high_limit", line.high_limit);
            out.set("flags", line.flags);
        }
        EntryData::Offer(offer) => {
            out.set("owner", offer.owner.to_address());
            out.set("sequence", offer.sequence);
            out.set("taker_pays", amount_json(&offer.taker_pays));
            out.set("taker_gets", amount_json(&offer.taker_gets));
            out.set("quality", offer.quality);
        }
        EntryData::SignerList { owner, list } => {
            out.set("owner", owner.to_address());
            out.set("quorum", list.quorum);
            let mut signers = Value::array();
            for (account, weight) in &list.signers {
                let mut s = Value::object();
                s.set("account", account.to_address());
                s.set("weight", u64::from(*weight));
                signers.push(s);
            }
            out.set("signers", signers);
        }
        EntryData::Escrow { owner, escrow } => {
            out.set("owner", owner.to_address());
            out.set("destination", escrow.destination.to_address());
            out.set("amount", escrow.amount);
            out.set("finish_after", escrow.finish_after);
        }
        EntryData::Check { owner, check } => {
            out.set("owner", owner.to_address());
            out.set("destination", check.destination.to_address());
            out.set("send_max", amount_json(&check.send_max));
        }
        EntryData::PaymentChannel { owner, channel } => {
            out.set("owner", owner.to_address());
            out.set("destination", channel.destination.to_address());
            out.set("amount", channel.amount);
            out.set("balance", channel.balance);
        }
        EntryData::NftPage { owner, page } => {
            out.set("owner", owner.to_address());
            out.set("token_count", page.token_count);
        }
        EntryData::Ticket { owner, ticket } => {
            out.set("owner", owner.to_address());
            out.set("ticket_sequence", ticket.sequence);
        }
        EntryData::DepositPreauth { owner, preauth } => {
            out.set("owner", owner.to_address());
            out.set("authorized", preauth.authorized.to_address());
        }
    }
    out
}
