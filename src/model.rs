//! Domain model for the reconciliation core.
//!
//! Everything here lives only for the duration of one run. The config
//! artifact on disk is the sole durable state this crate owns.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Canonical torrent identifier: a 40-character lowercase hex info hash.
///
/// `parse` lowercases its input before validating the shape, so two
/// spellings of the same hash collapse to one value and all comparisons are
/// effectively case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InfoHash(String);

impl InfoHash {
    /// Parse and normalize a raw identifier.
    ///
    /// Returns None unless the input is exactly 40 hex characters.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_lowercase();
        if normalized.len() != 40 || hex::decode(&normalized).is_err() {
            return None;
        }
        Some(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InfoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The identifiers one upstream currently manages, labeled for reporting.
///
/// Immutable once collection finishes; the label and count only ever feed
/// the run report.
#[derive(Debug, Clone)]
pub struct ManagedSet {
    label: String,
    hashes: HashSet<InfoHash>,
}

impl ManagedSet {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            hashes: HashSet::new(),
        }
    }

    /// Admit one identifier. Returns false if it was already present.
    pub fn insert(&mut self, hash: InfoHash) -> bool {
        self.hashes.insert(hash)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    pub fn contains(&self, hash: &InfoHash) -> bool {
        self.hashes.contains(hash)
    }

    /// Union several managed sets into one lookup set. The sources are
    /// independent and know nothing about each other; the union happens
    /// here, in the caller's hands.
    pub fn union_all(sets: &[ManagedSet]) -> HashSet<InfoHash> {
        let mut union = HashSet::new();
        for set in sets {
            union.extend(set.hashes.iter().cloned());
        }
        union
    }
}

/// One download known to the client at query time.
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryItem {
    pub name: String,
    pub category: String,
    pub state: String,
    pub ratio: f64,
}

/// Full download-client inventory, keyed by identifier.
///
/// Ordered by hash so every walk over it - and everything rendered from
/// it - is deterministic across runs.
pub type Inventory = BTreeMap<InfoHash, InventoryItem>;

/// Why an identifier was marked for exclusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    /// Absent from every managed set collected this run.
    Unmanaged,
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockReason::Unmanaged => f.write_str("not referenced by any managed history"),
        }
    }
}

/// One identifier to exclude from future automated searches.
///
/// Recomputed in full on every run and handed straight to the config
/// mutator; never merged with a previous run's result.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockDecision {
    pub hash: InfoHash,
    pub name: String,
    pub category: String,
    pub reason: BlockReason,
}
