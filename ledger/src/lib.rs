//! Ledger state for the Meridian RPC core.
//!
//! A [`snapshot::LedgerSnapshot`] is an immutable point-in-time view of the
//! object store: ledger entries keyed by 256-bit id, account roots, and the
//! directory page chains that group entries per owner (and per order book).
//! The [`resolver::LedgerMaster`] maps a request's ledger specifier — index,
//! hash, or one of the current/closed/validated aliases — to a snapshot.

pub mod directory;
pub mod entry;
pub mod resolver;
pub mod snapshot;

pub use directory::{
    walk_filtered, DirWalker, Directory, Marker, MarkerError, Resume, WalkOutcome,
};
pub use entry::{
    book_id, AccountRoot, Amount, EntryData, EntryType, LedgerEntry, LineView, NftPage, Offer,
    SignerList, TrustLine, GLOBAL_FREEZE,
};
pub use resolver::{LedgerMaster, LedgerSpec, ResolveError};
pub use snapshot::{LedgerBuilder, LedgerHeader, LedgerSnapshot};
