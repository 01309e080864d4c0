//! Ledger entry types and the viewpoint projection for relationship entries.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use meridian_types::{AccountId, Hash256};
use serde::{Deserialize, Serialize};

// Trust line flag bitfield. Fields are stored relative to the canonical
// low/high ordering of the two participants, never to caller/peer roles.
pub const LOW_NO_RIPPLE: u32 = 0x0001;
pub const HIGH_NO_RIPPLE: u32 = 0x0002;
pub const LOW_FREEZE: u32 = 0x0004;
pub const HIGH_FREEZE: u32 = 0x0008;
pub const LOW_AUTH: u32 = 0x0010;
pub const HIGH_AUTH: u32 = 0x0020;

/// Account root flag: issuer has suspended trading/rippling of its assets
/// across all trust lines.
pub const GLOBAL_FREEZE: u32 = 0x0001;

/// The fixed set of enumerable ledger entry types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryType {
    /// Trust line (wire token `state`).
    TrustLine,
    Offer,
    SignerList,
    Escrow,
    Check,
    PaymentChannel,
    NftPage,
    Ticket,
    DepositPreauth,
}

impl EntryType {
    /// The wire token accepted by the `type` parameter.
    pub fn token(&self) -> &'static str {
        match self {
            EntryType::TrustLine => "state",
            EntryType::Offer => "offer",
            EntryType::SignerList => "signer_list",
            EntryType::Escrow => "escrow",
            EntryType::Check => "check",
            EntryType::PaymentChannel => "payment_channel",
            EntryType::NftPage => "nft_page",
            EntryType::Ticket => "ticket",
            EntryType::DepositPreauth => "deposit_preauth",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "state" => Some(EntryType::TrustLine),
            "offer" => Some(EntryType::Offer),
            "signer_list" => Some(EntryType::SignerList),
            "escrow" => Some(EntryType::Escrow),
            "check" => Some(EntryType::Check),
            "payment_channel" => Some(EntryType::PaymentChannel),
            "nft_page" => Some(EntryType::NftPage),
            "ticket" => Some(EntryType::Ticket),
            "deposit_preauth" => Some(EntryType::DepositPreauth),
            _ => None,
        }
    }

    /// Entry types that prevent the owning account from being deleted.
    pub fn is_deletion_blocker(&self) -> bool {
        matches!(
            self,
            EntryType::TrustLine
                | EntryType::Escrow
                | EntryType::Check
                | EntryType::PaymentChannel
                | EntryType::NftPage
        )
    }
}

/// An issued asset amount. Native amounts carry no issuer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    pub currency: String,
    pub issuer: Option<AccountId>,
    pub value: String,
}

impl Amount {
    pub fn native(value: impl Into<String>) -> Self {
        Self {
            currency: "MRD".to_owned(),
            issuer: None,
            value: value.into(),
        }
    }

    pub fn issued(currency: impl Into<String>, issuer: AccountId, value: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
            issuer: Some(issuer),
            value: value.into(),
        }
    }
}

/// A bilateral credit line between two accounts for one currency.
///
/// `low` and `high` are ordered by account-id comparison; `balance` is held
/// from the low side's perspective (positive means low is owed).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustLine {
    pub low: AccountId,
    pub high: AccountId,
    pub currency: String,
    pub balance: i64,
    pub low_limit: u64,
    pub high_limit: u64,
    pub flags: u32,
}

/// A trust line as seen from one participant's side.
///
/// All low/high perspective swapping happens here, once. Callers must never
/// branch on which side an account occupies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineView {
    pub peer: AccountId,
    pub currency: String,
    pub balance: i64,
    pub limit: u64,
    pub limit_peer: u64,
    pub no_ripple: bool,
    pub no_ripple_peer: bool,
    pub freeze: bool,
    pub freeze_peer: bool,
    pub authorized: bool,
    pub peer_authorized: bool,
}

impl LineView {
    /// Project `line` from `viewpoint`'s side. Returns `None` when the
    /// viewpoint account is not a participant.
    pub fn project(line: &TrustLine, viewpoint: &AccountId) -> Option<Self> {
        let from_low = if *viewpoint == line.low {
            true
        } else if *viewpoint == line.high {
            false
        } else {
            return None;
        };
        let flag = |bit: u32| line.flags & bit != 0;
        Some(if from_low {
            LineView {
                peer: line.high,
                currency: line.currency.clone(),
                balance: line.balance,
                limit: line.low_limit,
                limit_peer: line.high_limit,
                no_ripple: flag(LOW_NO_RIPPLE),
                no_ripple_peer: flag(HIGH_NO_RIPPLE),
                freeze: flag(LOW_FREEZE),
                freeze_peer: flag(HIGH_FREEZE),
                authorized: flag(LOW_AUTH),
                peer_authorized: flag(HIGH_AUTH),
            }
        } else {
            LineView {
                peer: line.low,
                currency: line.currency.clone(),
                balance: -line.balance,
                limit: line.high_limit,
                limit_peer: line.low_limit,
                no_ripple: flag(HIGH_NO_RIPPLE),
                no_ripple_peer: flag(LOW_NO_RIPPLE),
                freeze: flag(HIGH_FREEZE),
                freeze_peer: flag(LOW_FREEZE),
                authorized: flag(HIGH_AUTH),
                peer_authorized: flag(LOW_AUTH),
            }
        })
    }
}

/// An order on a book, priced by `quality` (pays per gets, scaled integer;
/// lower is a better price for the taker).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    pub owner: AccountId,
    pub sequence: u32,
    pub taker_pays: Amount,
    pub taker_gets: Amount,
    pub quality: u64,
}

impl Offer {
    /// Identifier of the book this offer trades on.
    pub fn book(&self) -> Hash256 {
        book_id(&self.taker_pays, &self.taker_gets)
    }
}

/// Derive the id of the trust line between two accounts for one currency.
/// Argument order does not matter; the canonical low/high ordering is
/// applied here, so the result matches the stored entry's keylet.
pub fn line_id(a: AccountId, b: AccountId, currency: &str) -> Hash256 {
    let (low, high) = canonical_order(a, b);
    let mut hasher = Blake2b::<U32>::new();
    hasher.update(b"line");
    hasher.update(low.as_bytes());
    hasher.update(high.as_bytes());
    hasher.update(currency.as_bytes());
    finish(hasher)
}

/// Compute the directory id of the (pays, gets) order book.
pub fn book_id(taker_pays: &Amount, taker_gets: &Amount) -> Hash256 {
    let mut hasher = Blake2b::<U32>::new();
    hasher.update(b"book");
    hasher.update(taker_pays.currency.as_bytes());
    if let Some(issuer) = &taker_pays.issuer {
        hasher.update(issuer.as_bytes());
    }
    hasher.update(b"/");
    hasher.update(taker_gets.currency.as_bytes());
    if let Some(issuer) = &taker_gets.issuer {
        hasher.update(issuer.as_bytes());
    }
    finish(hasher)
}

/// Top-level account record. Not enumerable through owner directories.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRoot {
    pub account: AccountId,
    pub sequence: u32,
    pub balance: u64,
    pub owner_count: u32,
    pub flags: u32,
}

impl AccountRoot {
    pub fn global_freeze(&self) -> bool {
        self.flags & GLOBAL_FREEZE != 0
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerList {
    pub quorum: u32,
    pub signers: Vec<(AccountId, u16)>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Escrow {
    pub destination: AccountId,
    pub amount: u64,
    pub finish_after: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Check {
    pub destination: AccountId,
    pub send_max: Amount,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentChannel {
    pub destination: AccountId,
    pub amount: u64,
    pub balance: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftPage {
    pub token_count: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub sequence: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositPreauth {
    pub authorized: AccountId,
}

/// The payload of a ledger entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryData {
    TrustLine(TrustLine),
    Offer(Offer),
    SignerList { owner: AccountId, list: SignerList },
    Escrow { owner: AccountId, escrow: Escrow },
    Check { owner: AccountId, check: Check },
    PaymentChannel { owner: AccountId, channel: PaymentChannel },
    NftPage { owner: AccountId, page: NftPage },
    Ticket { owner: AccountId, ticket: Ticket },
    DepositPreauth { owner: AccountId, preauth: DepositPreauth },
}

/// A ledger entry: 256-bit key plus payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Hash256,
    pub data: EntryData,
}

impl LedgerEntry {
    /// Create an entry, deriving its id from the identifying fields of the
    /// payload (the keylet).
    pub fn new(data: EntryData) -> Self {
        let id = keylet(&data);
        Self { id, data }
    }

    pub fn entry_type(&self) -> EntryType {
        match &self.data {
            EntryData::TrustLine(_) => EntryType::TrustLine,
            EntryData::Offer(_) => EntryType::Offer,
            EntryData::SignerList { .. } => EntryType::SignerList,
            EntryData::Escrow { .. } => EntryType::Escrow,
            EntryData::Check { .. } => EntryType::Check,
            EntryData::PaymentChannel { .. } => EntryType::PaymentChannel,
            EntryData::NftPage { .. } => EntryType::NftPage,
            EntryData::Ticket { .. } => EntryType::Ticket,
            EntryData::DepositPreauth { .. } => EntryType::DepositPreauth,
        }
    }

    /// Accounts whose owner directories reference this entry. Trust lines
    /// appear in both participants' directories.
    pub fn owners(&self) -> Vec<AccountId> {
        match &self.data {
            EntryData::TrustLine(line) => vec![line.low, line.high],
            EntryData::Offer(offer) => vec![offer.owner],
            EntryData::SignerList { owner, .. }
            | EntryData::Escrow { owner, .. }
            | EntryData::Check { owner, .. }
            | EntryData::PaymentChannel { owner, .. }
            | EntryData::NftPage { owner, .. }
            | EntryData::Ticket { owner, .. }
            | EntryData::DepositPreauth { owner, .. } => vec![*owner],
        }
    }
}

/// Derive the 256-bit key of an entry from its identifying fields.
fn keylet(data: &EntryData) -> Hash256 {
    let mut hasher = Blake2b::<U32>::new();
    match data {
        EntryData::TrustLine(line) => {
            return line_id(line.low, line.high, &line.currency);
        }
        EntryData::Offer(offer) => {
            hasher.update(b"offer");
            hasher.update(offer.owner.as_bytes());
            hasher.update(offer.sequence.to_le_bytes());
        }
        EntryData::SignerList { owner, .. } => {
            hasher.update(b"signers");
            hasher.update(owner.as_bytes());
        }
        EntryData::Escrow { owner, escrow } => {
            hasher.update(b"escrow");
            hasher.update(owner.as_bytes());
            hasher.update(escrow.finish_after.to_le_bytes());
        }
        EntryData::Check { owner, check } => {
            hasher.update(b"check");
            hasher.update(owner.as_bytes());
            hasher.update(check.destination.as_bytes());
        }
        EntryData::PaymentChannel { owner, channel } => {
            hasher.update(b"paychan");
            hasher.update(owner.as_bytes());
            hasher.update(channel.destination.as_bytes());
        }
        EntryData::NftPage { owner, page } => {
            hasher.update(b"nftpage");
            hasher.update(owner.as_bytes());
            hasher.update(page.token_count.to_le_bytes());
        }
        EntryData::Ticket { owner, ticket } => {
            hasher.update(b"ticket");
            hasher.update(owner.as_bytes());
            hasher.update(ticket.sequence.to_le_bytes());
        }
        EntryData::DepositPreauth { owner, preauth } => {
            hasher.update(b"preauth");
            hasher.update(owner.as_bytes());
            hasher.update(preauth.authorized.as_bytes());
        }
    }
    finish(hasher)
}

fn finish(hasher: Blake2b<U32>) -> Hash256 {
    let out = hasher.finalize();
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&out);
    Hash256::new(bytes)
}

/// Order two accounts canonically for trust line storage.
pub fn canonical_order(a: AccountId, b: AccountId) -> (AccountId, AccountId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(byte: u8) -> AccountId {
        AccountId::new([byte; 20])
    }

    fn line() -> TrustLine {
        TrustLine {
            low: account(1),
            high: account(2),
            currency: "USD".into(),
            balance: 250,
            low_limit: 1000,
            high_limit: 500,
            flags: LOW_FREEZE | HIGH_NO_RIPPLE | LOW_AUTH,
        }
    }

    #[test]
    fn projection_from_low_side() {
        let view = LineView::project(&line(), &account(1)).expect("participant");
        assert_eq!(view.peer, account(2));
        assert_eq!(view.balance, 250);
        assert_eq!(view.limit, 1000);
        assert_eq!(view.limit_peer, 500);
        assert!(view.freeze);
        assert!(!view.freeze_peer);
        assert!(!view.no_ripple);
        assert!(view.no_ripple_peer);
        assert!(view.authorized);
        assert!(!view.peer_authorized);
    }

    #[test]
    fn projection_from_high_side_swaps_everything() {
        let view = LineView::project(&line(), &account(2)).expect("participant");
        assert_eq!(view.peer, account(1));
        assert_eq!(view.balance, -250);
        assert_eq!(view.limit, 500);
        assert_eq!(view.limit_peer, 1000);
        assert!(!view.freeze);
        assert!(view.freeze_peer);
        assert!(view.no_ripple);
        assert!(!view.no_ripple_peer);
        assert!(!view.authorized);
        assert!(view.peer_authorized);
    }

    #[test]
    fn projection_rejects_non_participant() {
        assert!(LineView::project(&line(), &account(9)).is_none());
    }

    #[test]
    fn type_tokens_roundtrip() {
        for ty in [
            EntryType::TrustLine,
            EntryType::Offer,
            EntryType::SignerList,
            EntryType::Escrow,
            EntryType::Check,
            EntryType::PaymentChannel,
            EntryType::NftPage,
            EntryType::Ticket,
            EntryType::DepositPreauth,
        ] {
            assert_eq!(EntryType::from_token(ty.token()), Some(ty));
        }
        assert_eq!(EntryType::from_token("bogus"), None);
    }

    #[test]
    fn deletion_blockers_are_the_fixed_set() {
        assert!(EntryType::TrustLine.is_deletion_blocker());
        assert!(EntryType::Escrow.is_deletion_blocker());
        assert!(EntryType::Check.is_deletion_blocker());
        assert!(EntryType::PaymentChannel.is_deletion_blocker());
        assert!(EntryType::NftPage.is_deletion_blocker());
        assert!(!EntryType::Offer.is_deletion_blocker());
        assert!(!EntryType::SignerList.is_deletion_blocker());
        assert!(!EntryType::Ticket.is_deletion_blocker());
    }

    #[test]
    fn keylet_is_deterministic() {
        let a = LedgerEntry::new(EntryData::TrustLine(line()));
        let b = LedgerEntry::new(EntryData::TrustLine(line()));
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn line_id_matches_the_entry_keylet_in_either_order() {
        let entry = LedgerEntry::new(EntryData::TrustLine(line()));
        assert_eq!(line_id(account(1), account(2), "USD"), entry.id);
        assert_eq!(line_id(account(2), account(1), "USD"), entry.id);
        assert_ne!(line_id(account(1), account(2), "EUR"), entry.id);
    }

    #[test]
    fn trust_line_is_owned_by_both_sides() {
        let entry = LedgerEntry::new(EntryData::TrustLine(line()));
        assert_eq!(entry.owners(), vec![account(1), account(2)]);
    }
}
