//! src/cache/dir_cache.rs
//! ============================================================================
//! # DirCache — In-Memory Directory Scan Cache
//!
//! One `DirEntryState` per visited path, keyed by absolute path. The cache is
//! the single source of truth for what the UI renders. It is owned by the
//! application state and mutated only from the event-loop control flow, so it
//! needs no interior locking; background tasks report results as actions and
//! the event loop writes them here after validating their sequence token.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::persist::store::PersistedEntry;

/// Scan lifecycle for a cached directory.
///
/// Transitions: `Unscanned → Scanning → Scanned`, or `Scanning → Unscanned`
/// on failure. A forced rescan re-enters `Scanning` from `Scanned`; nothing
/// else regresses a `Scanned` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanStatus {
    #[default]
    Unscanned,
    Scanning,
    Scanned,
}

/// One measured child directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizedChild {
    pub path: PathBuf,
    pub size_kb: u64,
}

/// Cached state for one directory.
#[derive(Debug, Clone, Default)]
pub struct DirEntryState {
    pub path: PathBuf,
    pub status: ScanStatus,
    /// Immediate child directories, alphabetical, no duplicates. Populated
    /// lazily and independently of sizing.
    pub child_paths: Vec<PathBuf>,
    /// Sized children, descending by size, truncated to the cache's top-N.
    /// Non-empty only once a scan has completed.
    pub sized_children: Vec<SizedChild>,
    /// The directory's own aggregate size, refreshed after each scan.
    pub size_kb: Option<u64>,
    pub last_scan: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl DirEntryState {
    fn placeholder(path: PathBuf) -> Self {
        DirEntryState {
            path,
            ..DirEntryState::default()
        }
    }

    /// The currently selectable children: sized results when present,
    /// otherwise the alphabetical listing.
    pub fn navigable(&self) -> Vec<PathBuf> {
        if self.sized_children.is_empty() {
            self.child_paths.clone()
        } else {
            self.sized_children.iter().map(|c| c.path.clone()).collect()
        }
    }

    /// Size of a child as last measured, if known.
    pub fn child_size_kb(&self, child: &Path) -> Option<u64> {
        self.sized_children
            .iter()
            .find(|c| c.path == child)
            .map(|c| c.size_kb)
    }
}

/// In-memory mapping from absolute path to its scan state.
#[derive(Debug)]
pub struct DirCache {
    entries: HashMap<PathBuf, DirEntryState>,
    top_n: usize,
}

impl DirCache {
    pub fn new(top_n: usize) -> Self {
        DirCache {
            entries: HashMap::new(),
            top_n,
        }
    }

    pub fn get(&self, path: &Path) -> Option<&DirEntryState> {
        self.entries.get(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert an `Unscanned` placeholder if the path is not cached yet.
    /// Returns true when the caller should (re)populate `child_paths`, i.e.
    /// the entry is new or was hydrated without a listing.
    pub fn ensure(&mut self, path: &Path) -> bool {
        let entry = self
            .entries
            .entry(path.to_path_buf())
            .or_insert_with(|| DirEntryState::placeholder(path.to_path_buf()));
        entry.child_paths.is_empty()
    }

    /// Replace the child listing, alphabetical and deduplicated.
    /// No-op when the entry has been removed in the meantime.
    pub fn set_children(&mut self, path: &Path, mut children: Vec<PathBuf>) {
        let Some(entry) = self.entries.get_mut(path) else {
            return;
        };
        children.sort();
        children.dedup();
        entry.child_paths = children;
    }

    /// Mark a scan as started; clears any stale error.
    pub fn mark_scanning(&mut self, path: &Path) {
        let entry = self
            .entries
            .entry(path.to_path_buf())
            .or_insert_with(|| DirEntryState::placeholder(path.to_path_buf()));
        entry.status = ScanStatus::Scanning;
        entry.error = None;
    }

    /// Commit completed scan results: sort descending, truncate to top-N,
    /// mark `Scanned`. No-op when the entry has been removed.
    pub fn commit_scan(&mut self, path: &Path, mut sized: Vec<SizedChild>, at: DateTime<Utc>) {
        let Some(entry) = self.entries.get_mut(path) else {
            debug!("discarding scan commit for evicted entry {}", path.display());
            return;
        };
        sized.sort_by(|a, b| b.size_kb.cmp(&a.size_kb));
        sized.truncate(self.top_n);
        entry.sized_children = sized;
        entry.status = ScanStatus::Scanned;
        entry.last_scan = Some(at);
        entry.error = None;
    }

    /// Revert a failed scan to `Unscanned` with a message; the user must
    /// re-trigger manually.
    pub fn mark_failed(&mut self, path: &Path, message: String) {
        if let Some(entry) = self.entries.get_mut(path) {
            entry.status = ScanStatus::Unscanned;
            entry.error = Some(message);
        }
    }

    pub fn set_own_size(&mut self, path: &Path, size_kb: u64) {
        if let Some(entry) = self.entries.get_mut(path) {
            entry.size_kb = Some(size_kb);
        }
    }

    /// Delete an entry; also strips the path from the parent entry's
    /// `child_paths` and `sized_children` when the parent is cached.
    pub fn remove(&mut self, path: &Path) {
        self.entries.remove(path);
        if let Some(parent) = path.parent()
            && let Some(parent_entry) = self.entries.get_mut(parent)
        {
            parent_entry.child_paths.retain(|p| p != path);
            parent_entry.sized_children.retain(|c| c.path != path);
        }
    }

    /// Seed the cache from persisted scan results. Hydrated entries come back
    /// `Scanned` with their sized children restored; `child_paths` stays
    /// empty and is refilled lazily on the next visit.
    pub fn hydrate(&mut self, persisted: HashMap<PathBuf, PersistedEntry>) {
        for (path, saved) in persisted {
            let mut entry = DirEntryState::placeholder(path.clone());
            entry.status = ScanStatus::Scanned;
            entry.sized_children = saved.sized_children;
            entry.sized_children.sort_by(|a, b| b.size_kb.cmp(&a.size_kb));
            entry.sized_children.truncate(self.top_n);
            entry.last_scan = Some(saved.last_scan);
            self.entries.insert(path, entry);
        }
        debug!("hydrated {} cached scans", self.entries.len());
    }
}

// ------------------------------------------------------------------------- //
// Tests
// ------------------------------------------------------------------------- //
