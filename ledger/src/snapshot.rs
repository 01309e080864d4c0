//! Immutable point-in-time views of the object store.
//!
//! A snapshot is built once (by the builder below, fed from consensus or a
//! dev seed) and then only read. Handlers borrow it through an `Arc` for the
//! duration of one request; concurrent walks need no locking.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use meridian_types::{AccountId, Hash256, LedgerSeq};
use std::collections::HashMap;

use crate::directory::Directory;
use crate::entry::{AccountRoot, EntryData, LedgerEntry, LineView};

/// Header data retained even for pruned ledgers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerHeader {
    pub seq: LedgerSeq,
    pub hash: Hash256,
    pub parent: Hash256,
    pub close_time: u64,
}

/// An immutable view of all ledger state at one sequence number.
#[derive(Clone, Debug, PartialEq)]
pub struct LedgerSnapshot {
    header: LedgerHeader,
    entries: HashMap<Hash256, LedgerEntry>,
    accounts: HashMap<AccountId, AccountRoot>,
    owner_dirs: HashMap<AccountId, Directory>,
    book_dirs: HashMap<Hash256, Directory>,
}

impl LedgerSnapshot {
    pub fn header(&self) -> &LedgerHeader {
        &self.header
    }

    pub fn seq(&self) -> LedgerSeq {
        self.header.seq
    }

    pub fn hash(&self) -> Hash256 {
        self.header.hash
    }

    pub fn entry(&self, id: &Hash256) -> Option<&LedgerEntry> {
        self.entries.get(id)
    }

    pub fn account(&self, id: &AccountId) -> Option<&AccountRoot> {
        self.accounts.get(id)
    }

    /// The directory of entries owned by `owner`, if any exist.
    pub fn owner_dir(&self, owner: &AccountId) -> Option<&Directory> {
        self.owner_dirs.get(owner)
    }

    /// The price-ordered directory of a book, if any offers exist on it.
    pub fn book_dir(&self, book: &Hash256) -> Option<&Directory> {
        self.book_dirs.get(book)
    }

    /// Whether `issuer` has suspended trading of its assets entirely.
    pub fn global_freeze(&self, issuer: &AccountId) -> bool {
        self.accounts
            .get(issuer)
            .map(|root| root.global_freeze())
            .unwrap_or(false)
    }

    /// Whether the (account, issuer, currency) trust line is frozen from the
    /// issuer's side. The line id is derived directly from the participants,
    /// so the check never walks a directory.
    pub fn line_frozen(&self, account: &AccountId, issuer: &AccountId, currency: &str) -> bool {
        let id = crate::entry::line_id(*account, *issuer, currency);
        let Some(entry) = self.entries.get(&id) else {
            return false;
        };
        let EntryData::TrustLine(line) = &entry.data else {
            return false;
        };
        // the issuer's view of the line carries its freeze flag
        LineView::project(line, issuer)
            .map(|view| view.freeze)
            .unwrap_or(false)
    }

    /// Derive the successor snapshot: same state, next sequence.
    pub fn advance(&self, close_time: u64) -> LedgerSnapshot {
        let mut next = self.clone();
        next.header.parent = self.header.hash;
        next.header.seq = self.header.seq + 1;
        next.header.close_time = close_time;
        next.header.hash = compute_hash(next.header.seq, next.header.parent, &next.entries);
        next
    }
}

/// Accumulates entries and account roots, then seals them into a snapshot
/// with directories built and the ledger hash computed.
pub struct LedgerBuilder {
    seq: LedgerSeq,
    parent: Hash256,
    close_time: u64,
    entries: Vec<LedgerEntry>,
    accounts: Vec<AccountRoot>,
}

impl LedgerBuilder {
    pub fn new(seq: LedgerSeq) -> Self {
        Self {
            seq,
            parent: Hash256::ZERO,
            close_time: 0,
            entries: Vec::new(),
            accounts: Vec::new(),
        }
    }

    /// Start from an existing snapshot's state (used when state changes
    /// between ledgers, e.g. an entry is deleted).
    pub fn from_snapshot(snap: &LedgerSnapshot) -> Self {
        Self {
            seq: snap.header.seq + 1,
            parent: snap.header.hash,
            close_time: snap.header.close_time,
            entries: snap.entries.values().cloned().collect(),
            accounts: snap.accounts.values().cloned().collect(),
        }
    }

    pub fn close_time(mut self, close_time: u64) -> Self {
        self.close_time = close_time;
        self
    }

    pub fn account(mut self, root: AccountRoot) -> Self {
        self.accounts.push(root);
        self
    }

    pub fn entry(mut self, entry: LedgerEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Drop an entry carried over from a previous snapshot.
    pub fn remove_entry(mut self, id: &Hash256) -> Self {
        self.entries.retain(|e| e.id != *id);
        self
    }

    pub fn build(self) -> LedgerSnapshot {
        let mut entries = HashMap::new();
        let mut owner_dirs: HashMap<AccountId, Directory> = HashMap::new();
        let mut book_dirs: HashMap<Hash256, Directory> = HashMap::new();

        // owner directories fill in insertion order
        for entry in &self.entries {
            for owner in entry.owners() {
                owner_dirs
                    .entry(owner)
                    .or_insert_with(|| Directory::new(owner.as_bytes().to_vec()))
                    .append(entry.id);
            }
        }

        // book directories fill best-quality-first
        let mut offers: Vec<&LedgerEntry> = self
            .entries
            .iter()
            .filter(|e| matches!(e.data, EntryData::Offer(_)))
            .collect();
        offers.sort_by_key(|e| match &e.data {
            EntryData::Offer(o) => (o.quality, e.id),
            _ => (u64::MAX, e.id),
        });
        for entry in offers {
            if let EntryData::Offer(offer) = &entry.data {
                let book = offer.book();
                book_dirs
                    .entry(book)
                    .or_insert_with(|| Directory::new(book.as_bytes().to_vec()))
                    .append(entry.id);
            }
        }

        for entry in self.entries {
            entries.insert(entry.id, entry);
        }
        let accounts = self
            .accounts
            .into_iter()
            .map(|root| (root.account, root))
            .collect();

        let hash = compute_hash(self.seq, self.parent, &entries);
        LedgerSnapshot {
            header: LedgerHeader {
                seq: self.seq,
                hash,
                parent: self.parent,
                close_time: self.close_time,
            },
            entries,
            accounts,
            owner_dirs,
            book_dirs,
        }
    }
}

/// Deterministic ledger hash: Blake2b-256 over sequence, parent and the
/// sorted entry ids.
fn compute_hash(
    seq: LedgerSeq,
    parent: Hash256,
    entries: &HashMap<Hash256, LedgerEntry>,
) -> Hash256 {
    let mut ids: Vec<&Hash256> = entries.keys().collect();
    ids.sort();
    let mut hasher = Blake2b::<U32>::new();
    hasher.update(seq.to_le_bytes());
    hasher.update(parent.as_bytes());
    for id in ids {
        hasher.update(id.as_bytes());
    }
    let out = hasher.finalize();
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&out);
    Hash256::new(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{
        Amount, EntryData, LedgerEntry, Offer, SignerList, TrustLine, GLOBAL_FREEZE, HIGH_FREEZE,
        LOW_FREEZE,
    };

    fn account(byte: u8) -> AccountId {
        AccountId::new([byte; 20])
    }

    fn trust_line(low: u8, high: u8, currency: &str) -> LedgerEntry {
        LedgerEntry::new(EntryData::TrustLine(TrustLine {
            low: account(low),
            high: account(high),
            currency: currency.into(),
            balance: 10,
            low_limit: 100,
            high_limit: 100,
            flags: 0,
        }))
    }

    fn sample() -> LedgerSnapshot {
        LedgerBuilder::new(3)
            .close_time(700_000_000)
            .account(AccountRoot {
                account: account(1),
                sequence: 9,
                balance: 1_000,
                owner_count: 2,
                flags: 0,
            })
            .entry(trust_line(1, 2, "USD"))
            .entry(LedgerEntry::new(EntryData::SignerList {
                owner: account(1),
                list: SignerList {
                    quorum: 2,
                    signers: vec![(account(5), 1), (account(6), 1)],
                },
            }))
            .build()
    }

    #[test]
    fn build_indexes_entries_and_directories() {
        let snap = sample();
        assert_eq!(snap.seq(), 3);
        let dir = snap.owner_dir(&account(1)).expect("owner dir");
        assert_eq!(dir.entry_count(), 2);
        // the trust line also lands in the high side's directory
        let peer_dir = snap.owner_dir(&account(2)).expect("peer dir");
        assert_eq!(peer_dir.entry_count(), 1);
        assert!(snap.account(&account(1)).is_some());
        assert!(snap.account(&account(2)).is_none());
    }

    #[test]
    fn hash_is_deterministic_and_sequence_sensitive() {
        let a = sample();
        let b = sample();
        assert_eq!(a.hash(), b.hash());
        let c = a.advance(700_000_010);
        assert_ne!(a.hash(), c.hash());
        assert_eq!(c.header().parent, a.hash());
        assert_eq!(c.seq(), 4);
    }

    #[test]
    fn from_snapshot_supports_entry_deletion() {
        let snap = sample();
        let line_id = trust_line(1, 2, "USD").id;
        let next = LedgerBuilder::from_snapshot(&snap)
            .remove_entry(&line_id)
            .build();
        assert_eq!(next.seq(), 4);
        assert!(next.entry(&line_id).is_none());
        assert_eq!(next.owner_dir(&account(1)).expect("dir").entry_count(), 1);
    }

    #[test]
    fn books_fill_in_quality_order() {
        let pays = Amount::issued("USD", account(9), "1");
        let gets = Amount::native("1");
        let mut builder = LedgerBuilder::new(1);
        for (seq, quality) in [(1u32, 300u64), (2, 100), (3, 200)] {
            builder = builder.entry(LedgerEntry::new(EntryData::Offer(Offer {
                owner: account(4),
                sequence: seq,
                taker_pays: pays.clone(),
                taker_gets: gets.clone(),
                quality,
            })));
        }
        let snap = builder.build();
        let book = crate::entry::book_id(&pays, &gets);
        let dir = snap.book_dir(&book).expect("book dir");
        let mut walker = crate::directory::DirWalker::from_start(dir);
        let mut qualities = Vec::new();
        while let Some(id) = walker.advance() {
            if let EntryData::Offer(o) = &snap.entry(&id).expect("offer").data {
                qualities.push(o.quality);
            }
        }
        assert_eq!(qualities, vec![100, 200, 300]);
    }

    #[test]
    fn freeze_projections() {
        let issuer = account(9);
        let holder = account(1);
        let (low, high) = crate::entry::canonical_order(holder, issuer);
        let freeze_flag = if low == issuer { LOW_FREEZE } else { HIGH_FREEZE };
        let snap = LedgerBuilder::new(1)
            .account(AccountRoot {
                account: issuer,
                sequence: 1,
                balance: 0,
                owner_count: 0,
                flags: GLOBAL_FREEZE,
            })
            .entry(LedgerEntry::new(EntryData::TrustLine(TrustLine {
                low,
                high,
                currency: "EUR".into(),
                balance: 0,
                low_limit: 50,
                high_limit: 50,
                flags: freeze_flag,
            })))
            .build();
        assert!(snap.global_freeze(&issuer));
        assert!(!snap.global_freeze(&holder));
        assert!(snap.line_frozen(&holder, &issuer, "EUR"));
        assert!(!snap.line_frozen(&holder, &issuer, "USD"));
    }

    #[test]
    fn line_freeze_lookup_is_independent_of_directory_size() {
        use crate::entry::Ticket;

        let issuer = account(9);
        let holder = account(1);
        let (low, high) = crate::entry::canonical_order(holder, issuer);
        let freeze_flag = if low == issuer { LOW_FREEZE } else { HIGH_FREEZE };
        // crowd the holder's directory well past one page before the line
        let mut builder = LedgerBuilder::new(1);
        for seq in 0..40u32 {
            builder = builder.entry(LedgerEntry::new(EntryData::Ticket {
                owner: holder,
                ticket: Ticket { sequence: seq },
            }));
        }
        let snap = builder
            .entry(LedgerEntry::new(EntryData::TrustLine(TrustLine {
                low,
                high,
                currency: "EUR".into(),
                balance: 0,
                low_limit: 50,
                high_limit: 50,
                flags: freeze_flag,
            })))
            .build();
        assert!(snap.line_frozen(&holder, &issuer, "EUR"));
        assert!(!snap.line_frozen(&holder, &issuer, "USD"));
        assert!(!snap.line_frozen(&issuer, &account(7), "EUR"));
    }
}
