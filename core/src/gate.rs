//! Duplicate detection against previously cataloged files.
//!
//! Identity is the original source path, loaded once at startup. Content
//! hashing is deliberately out of scope; two exports of the same shot from
//! different directories are treated as distinct files.

use std::collections::HashSet;
use std::path::Path;

/// Set of original paths already present in the catalog.
#[derive(Debug, Default)]
pub struct DuplicateGate {
    seen: HashSet<String>,
}

impl DuplicateGate {
    pub fn new(seen: HashSet<String>) -> Self {
        Self { seen }
    }

    /// True when the path has not been cataloged yet.
    pub fn is_new(&self, path: &Path) -> bool {
        !self.seen.contains(path.to_string_lossy().as_ref())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Insert/skip tally for one ingest run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestStats {
    pub inserted: usize,
    pub skipped: usize,
}
