//! src/persist/store.rs
//! ============================================================================
//! # ScanStore: Durable Scan Results Across Sessions
//!
//! A single JSON file in the project cache dir, mapping absolute path to the
//! last committed scan for that path. Loading tolerates a missing or corrupt
//! file (empty mapping, advisory log); saving is a read-modify-write of the
//! full mapping through a temp file + rename so a crash never truncates it.
//! Not safe against concurrent external writers; a single active process is
//! assumed.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cache::dir_cache::SizedChild;
use crate::config::config::Config;
use crate::error::AppError;

/// On-disk shape of one directory's scan result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedEntry {
    pub last_scan: DateTime<Utc>,
    pub sized_children: Vec<SizedChild>,
    /// Always stored empty; listings are refilled lazily after hydration.
    #[serde(default)]
    pub child_paths: Vec<PathBuf>,
}

/// Handle to the JSON scan store.
#[derive(Debug, Clone)]
pub struct ScanStore {
    file: PathBuf,
}

impl ScanStore {
    pub fn new(file: PathBuf) -> Self {
        ScanStore { file }
    }

    /// Store file at the default project cache location.
    pub fn at_default_location() -> Result<Self, AppError> {
        let dir: PathBuf = Config::cache_dir().map_err(AppError::from)?;
        Ok(ScanStore::new(dir.join("scans.json")))
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Load the full mapping. Missing or malformed storage yields an empty
    /// mapping, never an error to the caller.
    pub async fn load(&self) -> HashMap<PathBuf, PersistedEntry> {
        let text: String = match tokio::fs::read_to_string(&self.file).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return HashMap::new(),
            Err(e) => {
                warn!("scan store unreadable at {}: {}", self.file.display(), e);
                return HashMap::new();
            }
        };
        match serde_json::from_str(&text) {
            Ok(map) => map,
            Err(e) => {
                warn!("scan store corrupt at {}: {}", self.file.display(), e);
                HashMap::new()
            }
        }
    }

    /// Update a single path's entry, rewriting the whole mapping.
    pub async fn save(&self, path: &Path, entry: PersistedEntry) -> Result<(), AppError> {
        let mut map: HashMap<PathBuf, PersistedEntry> = self.load().await;
        map.insert(path.to_path_buf(), entry);
        self.write_all(&map).await
    }

    /// Drop a path from the store (after a deletion).
    pub async fn forget(&self, path: &Path) -> Result<(), AppError> {
        let mut map: HashMap<PathBuf, PersistedEntry> = self.load().await;
        if map.remove(path).is_some() {
            self.write_all(&map).await?;
        }
        Ok(())
    }

    async fn write_all(&self, map: &HashMap<PathBuf, PersistedEntry>) -> Result<(), AppError> {
        if let Some(parent) = self.file.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| AppError::Store {
                    path: self.file.clone(),
                    source,
                })?;
        }
        let json: String = serde_json::to_string_pretty(map)?;
        let tmp: PathBuf = self.file.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|source| AppError::Store {
                path: tmp.clone(),
                source,
            })?;
        tokio::fs::rename(&tmp, &self.file)
            .await
            .map_err(|source| AppError::Store {
                path: self.file.clone(),
                source,
            })?;
        Ok(())
    }
}

// ------------------------------------------------------------------------- //
// Tests
// ------------------------------------------------------------------------- //

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sized(path: &str, kb: u64) -> SizedChild {
        SizedChild {
            path: PathBuf::from(path),
            size_kb: kb,
        }
    }

    #[tokio::test]
    async fn missing_store_loads_empty() {
        let dir: TempDir = TempDir::new().expect("tempdir");
        let store: ScanStore = ScanStore::new(dir.path().join("scans.json"));
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn corrupt_store_loads_empty() {
        let dir: TempDir = TempDir::new().expect("tempdir");
        let file: PathBuf = dir.path().join("scans.json");
        tokio::fs::write(&file, "{ not json").await.expect("write");
        let store: ScanStore = ScanStore::new(file);
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn save_then_reload_roundtrip() {
        let dir: TempDir = TempDir::new().expect("tempdir");
        let store: ScanStore = ScanStore::new(dir.path().join("scans.json"));

        let entry: PersistedEntry = PersistedEntry {
            last_scan: Utc::now(),
            sized_children: vec![sized("/a/b/big", 200), sized("/a/b/small", 5)],
            child_paths: Vec::new(),
        };
        store.save(Path::new("/a/b"), entry).await.expect("save");

        // A second process would construct a fresh handle over the same file.
        let reloaded = ScanStore::new(store.file().to_path_buf()).load().await;
        let got = reloaded.get(Path::new("/a/b")).expect("entry persisted");
        assert_eq!(
            got.sized_children,
            vec![sized("/a/b/big", 200), sized("/a/b/small", 5)]
        );
        assert!(got.child_paths.is_empty());
    }

    #[tokio::test]
    async fn save_updates_single_path_in_full_mapping() {
        let dir: TempDir = TempDir::new().expect("tempdir");
        let store: ScanStore = ScanStore::new(dir.path().join("scans.json"));

        let first: PersistedEntry = PersistedEntry {
            last_scan: Utc::now(),
            sized_children: vec![sized("/x/one", 1)],
            child_paths: Vec::new(),
        };
        let second: PersistedEntry = PersistedEntry {
            last_scan: Utc::now(),
            sized_children: vec![sized("/y/two", 2)],
            child_paths: Vec::new(),
        };
        store.save(Path::new("/x"), first).await.expect("save /x");
        store.save(Path::new("/y"), second).await.expect("save /y");

        let map = store.load().await;
        assert_eq!(map.len(), 2);

        store.forget(Path::new("/x")).await.expect("forget");
        let map = store.load().await;
        assert!(!map.contains_key(Path::new("/x")));
        assert!(map.contains_key(Path::new("/y")));
    }
}
