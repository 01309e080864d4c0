//! Maps a request's ledger specifier to a concrete snapshot.
//!
//! The retained set (snapshots by sequence, hash index, pruned headers, and
//! the current/closed/validated roles) is one immutable structure behind an
//! `RwLock<Arc<…>>`. Publishing builds a new set and swaps the `Arc`, so
//! readers observe either the old or the new set, never a partial update.

use meridian_types::{Hash256, LedgerSeq};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};
use thiserror::Error;

use crate::snapshot::{LedgerHeader, LedgerSnapshot};

/// A request's ledger specifier: exactly one of index, hash, or alias.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LedgerSpec {
    Seq(LedgerSeq),
    Hash(Hash256),
    Current,
    Closed,
    Validated,
}

/// Resolution failure. Carries no snapshot state; resolving never mutates.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("ledger index too small")]
    IndexTooSmall,

    #[error("ledger index too large")]
    IndexTooLarge,

    #[error("ledger not found")]
    NotFound {
        /// Whether header data for the requested ledger is still retained.
        have_header: bool,
    },

    #[error("no current ledger")]
    NotSynchronized,
}

/// The immutable retained-ledger set published as one unit.
#[derive(Debug, Default)]
struct RetainedSet {
    by_seq: BTreeMap<LedgerSeq, Arc<LedgerSnapshot>>,
    by_hash: HashMap<Hash256, LedgerSeq>,
    /// Headers survive pruning for `have_header` reporting.
    headers: HashMap<Hash256, LedgerHeader>,
    current: Option<LedgerSeq>,
    closed: Option<LedgerSeq>,
    validated: Option<LedgerSeq>,
}

/// Shared, atomically-published view of retained ledgers.
#[derive(Debug, Default)]
pub struct LedgerMaster {
    inner: RwLock<Arc<RetainedSet>>,
}

impl LedgerMaster {
    pub fn new() -> Self {
        Self::default()
    }

    fn load(&self) -> Arc<RetainedSet> {
        match self.inner.read() {
            Ok(guard) => Arc::clone(&guard),
            // a poisoned lock still holds a fully-published set
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    fn mutate(&self, f: impl FnOnce(&mut RetainedSet)) {
        // the write lock is held across the copy, so two publishers cannot
        // both start from the same base set and lose an update
        let mut guard = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut next = RetainedSet {
            by_seq: guard.by_seq.clone(),
            by_hash: guard.by_hash.clone(),
            headers: guard.headers.clone(),
            current: guard.current,
            closed: guard.closed,
            validated: guard.validated,
        };
        f(&mut next);
        *guard = Arc::new(next);
    }

    /// Publish a snapshot as the new current ledger.
    pub fn publish_current(&self, snap: LedgerSnapshot) {
        let snap = Arc::new(snap);
        self.mutate(|set| {
            let seq = snap.seq();
            set.by_hash.insert(snap.hash(), seq);
            set.headers.insert(snap.hash(), snap.header().clone());
            set.by_seq.insert(seq, Arc::clone(&snap));
            set.current = Some(seq);
        });
    }

    /// Mark a retained ledger as the most recent closed-for-consensus one.
    pub fn mark_closed(&self, seq: LedgerSeq) {
        self.mutate(|set| {
            if set.by_seq.contains_key(&seq) {
                set.closed = Some(seq);
            }
        });
    }

    /// Mark a retained ledger as network-validated.
    pub fn mark_validated(&self, seq: LedgerSeq) {
        self.mutate(|set| {
            if set.by_seq.contains_key(&seq) {
                set.validated = Some(seq);
            }
        });
    }

    /// Drop full snapshots below `floor`, keeping their headers.
    pub fn prune_below(&self, floor: LedgerSeq) {
        self.mutate(|set| {
            set.by_seq.retain(|seq, _| *seq >= floor);
            set.by_hash.retain(|_, seq| *seq >= floor);
        });
    }

    /// Sequence range of fully-retained ledgers.
    pub fn retained_range(&self) -> Option<(LedgerSeq, LedgerSeq)> {
        let set = self.load();
        let first = set.by_seq.keys().next()?;
        let last = set.by_seq.keys().next_back()?;
        Some((*first, *last))
    }

    pub fn current_seq(&self) -> Option<LedgerSeq> {
        self.load().current
    }

    pub fn closed_seq(&self) -> Option<LedgerSeq> {
        self.load().closed
    }

    pub fn validated_seq(&self) -> Option<LedgerSeq> {
        self.load().validated
    }

    /// The most recent validated sequence, used to report whether a resolved
    /// snapshot has reached finality.
    pub fn is_validated(&self, seq: LedgerSeq) -> bool {
        self.load().validated.map(|v| seq <= v).unwrap_or(false)
    }

    /// Resolve a specifier against the retained set. Read-only; repeated
    /// calls against an unchanged set return the same snapshot identity.
    pub fn resolve(&self, spec: &LedgerSpec) -> Result<Arc<LedgerSnapshot>, ResolveError> {
        let set = self.load();
        match spec {
            LedgerSpec::Current => role(&set, set.current),
            LedgerSpec::Closed => role(&set, set.closed),
            LedgerSpec::Validated => role(&set, set.validated),
            LedgerSpec::Hash(hash) => match set.by_hash.get(hash) {
                Some(seq) => set
                    .by_seq
                    .get(seq)
                    .cloned()
                    .ok_or(ResolveError::NotFound { have_header: true }),
                None => Err(ResolveError::NotFound {
                    have_header: set.headers.contains_key(hash),
                }),
            },
            LedgerSpec::Seq(seq) => {
                let (first, last) = match (set.by_seq.keys().next(), set.by_seq.keys().next_back())
                {
                    (Some(first), Some(last)) => (*first, *last),
                    _ => return Err(ResolveError::NotSynchronized),
                };
                if *seq < first {
                    return Err(ResolveError::IndexTooSmall);
                }
                if *seq > last {
                    return Err(ResolveError::IndexTooLarge);
                }
                set.by_seq.get(seq).cloned().ok_or_else(|| {
                    // pruned gap inside the range
                    let have_header = set.headers.values().any(|h| h.seq == *seq);
                    ResolveError::NotFound { have_header }
                })
            }
        }
    }
}

fn role(
    set: &RetainedSet,
    seq: Option<LedgerSeq>,
) -> Result<Arc<LedgerSnapshot>, ResolveError> {
    let seq = seq.ok_or(ResolveError::NotSynchronized)?;
    set.by_seq
        .get(&seq)
        .cloned()
        .ok_or(ResolveError::NotSynchronized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::LedgerBuilder;

    fn master_with_range(first: LedgerSeq, last: LedgerSeq) -> LedgerMaster {
        let master = LedgerMaster::new();
        let mut snap = LedgerBuilder::new(first).build();
        master.publish_current(snap.clone());
        for _ in first..last {
            snap = snap.advance(0);
            master.publish_current(snap.clone());
        }
        master
    }

    #[test]
    fn aliases_resolve_to_roles() {
        let master = master_with_range(5, 8);
        master.mark_closed(7);
        master.mark_validated(6);
        assert_eq!(master.resolve(&LedgerSpec::Current).expect("current").seq(), 8);
        assert_eq!(master.resolve(&LedgerSpec::Closed).expect("closed").seq(), 7);
        assert_eq!(
            master.resolve(&LedgerSpec::Validated).expect("validated").seq(),
            6
        );
    }

    #[test]
    fn index_bounds() {
        let master = master_with_range(5, 8);
        assert_eq!(
            master.resolve(&LedgerSpec::Seq(4)),
            Err(ResolveError::IndexTooSmall)
        );
        assert_eq!(
            master.resolve(&LedgerSpec::Seq(0)),
            Err(ResolveError::IndexTooSmall)
        );
        assert_eq!(
            master.resolve(&LedgerSpec::Seq(9)),
            Err(ResolveError::IndexTooLarge)
        );
        // the exact latest known index succeeds
        assert_eq!(master.resolve(&LedgerSpec::Seq(8)).expect("latest").seq(), 8);
    }

    #[test]
    fn hash_lookup_reports_header_retention() {
        let master = master_with_range(5, 8);
        let snap6 = master.resolve(&LedgerSpec::Seq(6)).expect("seq 6");
        let hash6 = snap6.hash();
        drop(snap6);
        master.prune_below(7);
        assert_eq!(
            master.resolve(&LedgerSpec::Hash(hash6)),
            Err(ResolveError::NotFound { have_header: true })
        );
        assert_eq!(
            master.resolve(&LedgerSpec::Hash(Hash256::new([0xAA; 32]))),
            Err(ResolveError::NotFound { have_header: false })
        );
    }

    #[test]
    fn resolution_is_idempotent() {
        let master = master_with_range(1, 4);
        let a = master.resolve(&LedgerSpec::Seq(2)).expect("first");
        let b = master.resolve(&LedgerSpec::Seq(2)).expect("second");
        assert!(Arc::ptr_eq(&a, &b), "same snapshot identity");
    }

    #[test]
    fn empty_master_is_not_synchronized() {
        let master = LedgerMaster::new();
        assert_eq!(
            master.resolve(&LedgerSpec::Current),
            Err(ResolveError::NotSynchronized)
        );
        assert_eq!(
            master.resolve(&LedgerSpec::Seq(1)),
            Err(ResolveError::NotSynchronized)
        );
    }

    #[test]
    fn concurrent_publishers_all_land() {
        let master = Arc::new(LedgerMaster::new());
        let handles: Vec<_> = (1..=8u32)
            .map(|seq| {
                let master = Arc::clone(&master);
                std::thread::spawn(move || {
                    master.publish_current(LedgerBuilder::new(seq).build());
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("publisher");
        }
        assert_eq!(master.retained_range(), Some((1, 8)));
        for seq in 1..=8 {
            assert!(master.resolve(&LedgerSpec::Seq(seq)).is_ok(), "seq {seq}");
        }
    }

    #[test]
    fn validated_flag_tracks_role() {
        let master = master_with_range(1, 5);
        master.mark_validated(3);
        assert!(master.is_validated(2));
        assert!(master.is_validated(3));
        assert!(!master.is_validated(4));
    }
}
