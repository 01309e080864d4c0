//! Directory page chains and the resumable page walker.
//!
//! An owner's entries are grouped into fixed-capacity pages forming a
//! singly-linked chain. Pages are addressed by Blake2b-256 of
//! (seed, page number), where the seed is the owner id (or book id for order
//! books). The walker is a plain value: its position serializes into a
//! [`Marker`] and is fully reconstructed from one, so no iteration state
//! outlives a request.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use meridian_types::Hash256;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Entries per directory page.
pub const PAGE_CAPACITY: usize = 32;

/// A page walk may touch at most `SCAN_FACTOR × limit` entries before it has
/// to yield a marker, so a filter that discards almost everything still
/// terminates in bounded work.
pub const SCAN_FACTOR: usize = 8;

/// One fixed-capacity directory page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirPage {
    pub id: Hash256,
    pub entries: Vec<Hash256>,
    pub next: Option<Hash256>,
}

/// A linked chain of directory pages, keyed by page id.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Directory {
    seed: Vec<u8>,
    root: Option<Hash256>,
    pages: HashMap<Hash256, DirPage>,
    page_count: u64,
}

impl Directory {
    /// Create an empty directory. The seed (owner id or book id) determines
    /// the page addressing.
    pub fn new(seed: impl Into<Vec<u8>>) -> Self {
        Self {
            seed: seed.into(),
            root: None,
            pages: HashMap::new(),
            page_count: 0,
        }
    }

    pub fn root(&self) -> Option<Hash256> {
        self.root
    }

    pub fn page(&self, id: &Hash256) -> Option<&DirPage> {
        self.pages.get(id)
    }

    pub fn is_empty(&self) -> bool {
        self.pages.values().all(|p| p.entries.is_empty())
    }

    /// Total entries across all pages.
    pub fn entry_count(&self) -> usize {
        self.pages.values().map(|p| p.entries.len()).sum()
    }

    /// Append an entry, opening a new page when the tail page is full.
    pub fn append(&mut self, entry: Hash256) {
        let tail = self.tail_page_id();
        match tail {
            Some(id) if self.pages[&id].entries.len() < PAGE_CAPACITY => {
                if let Some(p) = self.pages.get_mut(&id) {
                    p.entries.push(entry);
                }
            }
            _ => {
                let id = page_id(&self.seed, self.page_count);
                self.page_count += 1;
                self.pages.insert(
                    id,
                    DirPage {
                        id,
                        entries: vec![entry],
                        next: None,
                    },
                );
                match tail {
                    Some(prev) => {
                        if let Some(p) = self.pages.get_mut(&prev) {
                            p.next = Some(id);
                        }
                    }
                    None => self.root = Some(id),
                }
            }
        }
    }

    /// Remove an entry wherever it appears in the chain. Pages are left in
    /// place (possibly shorter), so markers pointing past the new end of a
    /// page become detectably stale.
    pub fn remove(&mut self, entry: &Hash256) -> bool {
        for page in self.pages.values_mut() {
            if let Some(pos) = page.entries.iter().position(|e| e == entry) {
                page.entries.remove(pos);
                return true;
            }
        }
        false
    }

    fn tail_page_id(&self) -> Option<Hash256> {
        let mut cursor = self.root?;
        loop {
            match self.pages.get(&cursor).and_then(|p| p.next) {
                Some(next) => cursor = next,
                None => return Some(cursor),
            }
        }
    }
}

/// Compute a page id from the directory seed and page number.
pub fn page_id(seed: &[u8], page_no: u64) -> Hash256 {
    let mut hasher = Blake2b::<U32>::new();
    hasher.update(b"dir");
    hasher.update(seed);
    hasher.update(page_no.to_le_bytes());
    let out = hasher.finalize();
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&out);
    Hash256::new(bytes)
}

/// A resumption point inside a directory: the page id and the offset of the
/// next entry to return. Textual form is `<64 hex>,<decimal offset>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Marker {
    pub page: Hash256,
    pub offset: u32,
}

/// Error classifying a rejected marker.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MarkerError {
    /// Not parseable: bad hex, wrong length or missing separator.
    #[error("malformed marker")]
    Malformed,

    /// Parseable, but the referenced page or position no longer exists.
    #[error("marker no longer valid")]
    Stale,
}

/// A parsed resumption request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resume {
    At(Marker),
    /// Legacy compatibility: a marker whose offset component is empty (the
    /// observable result of truncating a single-digit offset) is accepted
    /// and yields zero results instead of an error. Kept bit-for-bit; do not
    /// reuse this path for new marker formats.
    Exhausted,
}

impl Marker {
    /// Lenient parse used by the account enumerators. Strict callers (the
    /// book walker) should reject `Resume::Exhausted` themselves.
    pub fn parse_lenient(s: &str) -> Result<Resume, MarkerError> {
        let (page_part, offset_part) = s.split_once(',').ok_or(MarkerError::Malformed)?;
        let page = Hash256::from_str(page_part).map_err(|_| MarkerError::Malformed)?;
        if offset_part.is_empty() {
            return Ok(Resume::Exhausted);
        }
        let offset: u32 = offset_part.parse().map_err(|_| MarkerError::Malformed)?;
        Ok(Resume::At(Marker { page, offset }))
    }

    /// Strict parse: every syntactic defect, including an empty offset, is
    /// malformed.
    pub fn parse_strict(s: &str) -> Result<Marker, MarkerError> {
        match Self::parse_lenient(s)? {
            Resume::At(marker) => Ok(marker),
            Resume::Exhausted => Err(MarkerError::Malformed),
        }
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.page.to_hex(), self.offset)
    }
}

/// A value-type walker over a directory's page chain.
pub struct DirWalker<'a> {
    dir: &'a Directory,
    page: Option<&'a DirPage>,
    offset: usize,
}

impl<'a> DirWalker<'a> {
    /// Walk from the first entry of the root page.
    pub fn from_start(dir: &'a Directory) -> Self {
        let mut walker = Self {
            dir,
            page: dir.root.and_then(|id| dir.pages.get(&id)),
            offset: 0,
        };
        walker.normalize();
        walker
    }

    /// Reconstruct a walker from a marker. The page must still exist in the
    /// chain and the offset must be in range for its current contents.
    pub fn resume(dir: &'a Directory, marker: &Marker) -> Result<Self, MarkerError> {
        let page = dir.pages.get(&marker.page).ok_or(MarkerError::Stale)?;
        if marker.offset as usize >= page.entries.len() {
            return Err(MarkerError::Stale);
        }
        Ok(Self {
            dir,
            page: Some(page),
            offset: marker.offset as usize,
        })
    }

    /// A walker positioned past the end of the chain.
    pub fn exhausted(dir: &'a Directory) -> Self {
        Self {
            dir,
            page: None,
            offset: 0,
        }
    }

    /// Marker for the entry the next `advance` call would return, or `None`
    /// when the walk is complete.
    pub fn position(&self) -> Option<Marker> {
        self.page.map(|page| Marker {
            page: page.id,
            offset: self.offset as u32,
        })
    }

    /// Return the entry at the current position and step forward.
    pub fn advance(&mut self) -> Option<Hash256> {
        let page = self.page?;
        let entry = page.entries[self.offset];
        self.offset += 1;
        self.normalize();
        Some(entry)
    }

    /// Move past page boundaries and skip empty pages so `position` always
    /// points at a real entry.
    fn normalize(&mut self) {
        while let Some(page) = self.page {
            if self.offset < page.entries.len() {
                return;
            }
            self.page = page.next.and_then(|id| self.dir.pages.get(&id));
            self.offset = 0;
        }
    }
}

/// Result of a bounded, filtered page walk.
#[derive(Debug)]
pub struct WalkOutcome {
    pub entries: Vec<Hash256>,
    pub marker: Option<Marker>,
    /// Entries touched, including ones the filter discarded.
    pub scanned: usize,
}

/// Walk `dir` from `resume`, collecting up to `limit` entries accepted by
/// `accept`. Work is bounded: at most `SCAN_FACTOR × limit` entries (but at
/// least one full page) are touched before the walk yields a marker, even if
/// fewer than `limit` matches were found.
pub fn walk_filtered(
    dir: &Directory,
    resume: Option<Resume>,
    limit: usize,
    mut accept: impl FnMut(&Hash256) -> bool,
) -> Result<WalkOutcome, MarkerError> {
    let mut walker = match resume {
        None => DirWalker::from_start(dir),
        Some(Resume::At(marker)) => DirWalker::resume(dir, &marker)?,
        Some(Resume::Exhausted) => DirWalker::exhausted(dir),
    };
    let budget = limit.saturating_mul(SCAN_FACTOR).max(PAGE_CAPACITY);
    let mut entries = Vec::new();
    let mut scanned = 0usize;
    loop {
        let Some(position) = walker.position() else {
            // chain exhausted: terminal completion, no marker
            return Ok(WalkOutcome {
                entries,
                marker: None,
                scanned,
            });
        };
        if entries.len() == limit || scanned == budget {
            return Ok(WalkOutcome {
                entries,
                marker: Some(position),
                scanned,
            });
        }
        let Some(id) = walker.advance() else {
            return Ok(WalkOutcome {
                entries,
                marker: None,
                scanned,
            });
        };
        scanned += 1;
        if accept(&id) {
            entries.push(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(n: u8) -> Hash256 {
        Hash256::new([n; 32])
    }

    fn dir_with(n: u8) -> Directory {
        let mut dir = Directory::new(b"owner".to_vec());
        for i in 0..n {
            dir.append(entry(i));
        }
        dir
    }

    #[test]
    fn append_links_pages_in_order() {
        let dir = dir_with(80); // three pages: 32 + 32 + 16
        let root = dir.root().expect("root");
        let first = dir.page(&root).expect("first page");
        assert_eq!(first.entries.len(), PAGE_CAPACITY);
        let second = dir.page(&first.next.expect("second")).expect("page");
        assert_eq!(second.entries.len(), PAGE_CAPACITY);
        let third = dir.page(&second.next.expect("third")).expect("page");
        assert_eq!(third.entries.len(), 16);
        assert_eq!(third.next, None);
    }

    #[test]
    fn walker_visits_every_entry_once() {
        let dir = dir_with(80);
        let mut walker = DirWalker::from_start(&dir);
        let mut seen = Vec::new();
        while let Some(id) = walker.advance() {
            seen.push(id);
        }
        assert_eq!(seen.len(), 80);
        assert_eq!(seen[0], entry(0));
        assert_eq!(seen[79], entry(79));
    }

    #[test]
    fn marker_text_roundtrip() {
        let m = Marker {
            page: entry(9),
            offset: 17,
        };
        assert_eq!(Marker::parse_lenient(&m.to_string()), Ok(Resume::At(m)));
    }

    #[test]
    fn malformed_markers_are_distinguished_from_stale() {
        assert_eq!(Marker::parse_lenient("nonsense"), Err(MarkerError::Malformed));
        assert_eq!(
            Marker::parse_lenient("abcd,3"),
            Err(MarkerError::Malformed),
            "short page id"
        );
        let bad_hex = format!("{},3", "zz".repeat(32));
        assert_eq!(Marker::parse_lenient(&bad_hex), Err(MarkerError::Malformed));
        let bad_offset = format!("{},x", entry(1).to_hex());
        assert_eq!(Marker::parse_lenient(&bad_offset), Err(MarkerError::Malformed));
    }

    #[test]
    fn truncated_offset_is_accepted_and_exhausted() {
        // legacy: "<page>,5" truncated to "<page>," yields zero results
        let truncated = format!("{},", entry(1).to_hex());
        assert_eq!(Marker::parse_lenient(&truncated), Ok(Resume::Exhausted));
        assert_eq!(Marker::parse_strict(&truncated), Err(MarkerError::Malformed));
    }

    #[test]
    fn resume_rejects_missing_page() {
        let dir = dir_with(4);
        let marker = Marker {
            page: entry(0xEE),
            offset: 0,
        };
        assert!(matches!(
            DirWalker::resume(&dir, &marker),
            Err(MarkerError::Stale)
        ));
    }

    #[test]
    fn resume_rejects_out_of_range_offset() {
        let mut dir = dir_with(4);
        let root = dir.root().unwrap();
        let marker = Marker {
            page: root,
            offset: 3,
        };
        // valid before the deletion
        assert!(DirWalker::resume(&dir, &marker).is_ok());
        dir.remove(&entry(3));
        assert!(matches!(
            DirWalker::resume(&dir, &marker),
            Err(MarkerError::Stale)
        ));
    }

    #[test]
    fn pagination_is_complete_and_duplicate_free() {
        let dir = dir_with(80);
        let mut collected = Vec::new();
        let mut resume = None;
        loop {
            let out = walk_filtered(&dir, resume, 7, |_| true).expect("walk");
            collected.extend(out.entries);
            match out.marker {
                Some(m) => resume = Some(Resume::At(m)),
                None => break,
            }
        }
        assert_eq!(collected.len(), 80);
        let mut dedup = collected.clone();
        dedup.sort();
        dedup.dedup();
        assert_eq!(dedup.len(), 80, "no duplicates");
    }

    #[test]
    fn scan_budget_bounds_work_with_hostile_filter() {
        let dir = dir_with(200);
        let mut scanned_total = 0;
        let out = walk_filtered(&dir, None, 2, |_| false).expect("walk");
        scanned_total += out.scanned;
        // nothing matched, but the walk stopped after the budget with a
        // marker instead of scanning the whole chain
        assert!(out.entries.is_empty());
        assert!(out.marker.is_some());
        assert_eq!(out.scanned, PAGE_CAPACITY.max(2 * SCAN_FACTOR));
        assert!(scanned_total < 200);
    }

    #[test]
    fn exact_limit_on_final_entry_still_terminates_without_marker() {
        let dir = dir_with(6);
        let out = walk_filtered(&dir, None, 7, |_| true).expect("walk");
        assert_eq!(out.entries.len(), 6);
        assert!(out.marker.is_none());
    }

    #[test]
    fn full_limit_with_more_remaining_yields_marker_at_next_entry() {
        let dir = dir_with(10);
        let out = walk_filtered(&dir, None, 4, |_| true).expect("walk");
        assert_eq!(out.entries.len(), 4);
        let marker = out.marker.expect("marker");
        let rest = walk_filtered(&dir, Some(Resume::At(marker)), 10, |_| true).expect("walk");
        assert_eq!(rest.entries[0], entry(4));
        assert!(rest.marker.is_none());
    }
}
