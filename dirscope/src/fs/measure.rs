//! src/fs/measure.rs
//! ============================================================================
//! # Measure: Directory Size and Listing Capability
//!
//! The narrow interface the scan coordinator consumes: recursive aggregate
//! size in KiB and immediate child-directory listing. Two interchangeable
//! implementations exist, selected at startup: native traversal with
//! `walkdir`, and shelling out to `du`/`find`. Sizes are block-allocation
//! totals, not byte-exact file sizes, and traversal never crosses a mount
//! boundary.
//!
//! Neither operation errors to the caller: inaccessible paths measure as 0,
//! and a listing that fails both its primary and fallback strategy yields an
//! empty list with an advisory log.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::warn;
use walkdir::WalkDir;

use crate::config::config::MeasureBackend;

/// Size measurement and child listing, as consumed by the scan coordinator.
#[async_trait]
pub trait Measure: Send + Sync {
    /// Recursive allocated size in KiB, same filesystem only. Returns 0
    /// rather than failing on inaccessible paths.
    async fn measure_kb(&self, path: &Path) -> u64;

    /// Immediate child directories, alphabetical. Never errors; total
    /// failure yields an empty list with an advisory.
    async fn list_child_dirs(&self, path: &Path) -> Vec<PathBuf>;
}

/// Construct the configured backend.
pub fn create_measure(backend: MeasureBackend) -> Arc<dyn Measure> {
    match backend {
        MeasureBackend::Native => Arc::new(WalkdirMeasure),
        MeasureBackend::Shell => Arc::new(ShellMeasure),
    }
}

/// Allocated size of one filesystem object in bytes, `du`-style.
#[cfg(unix)]
fn allocated_bytes(meta: &std::fs::Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    // blocks() is in 512-byte units regardless of the filesystem block size
    meta.blocks() * 512
}

#[cfg(not(unix))]
fn allocated_bytes(meta: &std::fs::Metadata) -> u64 {
    meta.len()
}

/// Primary listing strategy shared by both backends: a plain `read_dir`
/// pass over the immediate children.
fn read_dir_listing(path: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut dirs: Vec<PathBuf> = Vec::new();
    for entry in std::fs::read_dir(path)? {
        let entry = entry?;
        // file_type() does not follow symlinks; a symlinked dir is skipped
        if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Secondary listing strategy: `find <path> -mindepth 1 -maxdepth 1 -type d`.
async fn find_listing(path: &Path) -> Option<Vec<PathBuf>> {
    let output = Command::new("find")
        .arg(path)
        .args(["-mindepth", "1", "-maxdepth", "1", "-type", "d"])
        .output()
        .await
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let mut dirs: Vec<PathBuf> = String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter(|l| !l.is_empty())
        .map(PathBuf::from)
        .collect();
    dirs.sort();
    Some(dirs)
}

/// Native backend: `walkdir` traversal summing block allocations.
pub struct WalkdirMeasure;

#[async_trait]
impl Measure for WalkdirMeasure {
    async fn measure_kb(&self, path: &Path) -> u64 {
        let root: PathBuf = path.to_path_buf();
        let result = tokio::task::spawn_blocking(move || {
            let bytes: u64 = WalkDir::new(&root)
                .same_file_system(true)
                .into_iter()
                .filter_map(Result::ok)
                .filter_map(|entry| entry.metadata().ok())
                .map(|meta| allocated_bytes(&meta))
                .sum();
            bytes / 1024
        })
        .await;

        match result {
            Ok(kb) => kb,
            Err(e) => {
                warn!("size traversal task failed for {}: {}", path.display(), e);
                0
            }
        }
    }

    async fn list_child_dirs(&self, path: &Path) -> Vec<PathBuf> {
        let root: PathBuf = path.to_path_buf();
        let primary = tokio::task::spawn_blocking(move || read_dir_listing(&root))
            .await
            .unwrap_or_else(|e| Err(std::io::Error::other(e)));

        match primary {
            Ok(dirs) if !dirs.is_empty() => dirs,
            other => {
                if let Err(e) = other {
                    warn!("read_dir listing failed for {}: {}", path.display(), e);
                }
                match find_listing(path).await {
                    Some(dirs) => dirs,
                    None => {
                        warn!("fallback listing failed for {}", path.display());
                        Vec::new()
                    }
                }
            }
        }
    }
}

/// Shell backend: `du -sk` for sizes, `find` for listings.
pub struct ShellMeasure;

#[async_trait]
impl Measure for ShellMeasure {
    async fn measure_kb(&self, path: &Path) -> u64 {
        // -x stays on one filesystem; -k reports KiB
        let output = match Command::new("du").args(["-s", "-k", "-x"]).arg(path).output().await {
            Ok(output) => output,
            Err(e) => {
                warn!("du failed to spawn for {}: {}", path.display(), e);
                return 0;
            }
        };
        // du exits non-zero on permission errors but still prints a total
        let text = String::from_utf8_lossy(&output.stdout);
        text.split_whitespace()
            .next()
            .and_then(|field| field.parse::<u64>().ok())
            .unwrap_or(0)
    }

    async fn list_child_dirs(&self, path: &Path) -> Vec<PathBuf> {
        if let Some(dirs) = find_listing(path).await {
            if !dirs.is_empty() {
                return dirs;
            }
        }
        let root: PathBuf = path.to_path_buf();
        let fallback = tokio::task::spawn_blocking(move || read_dir_listing(&root)).await;
        match fallback {
            Ok(Ok(dirs)) => dirs,
            Ok(Err(e)) => {
                warn!("fallback listing failed for {}: {}", path.display(), e);
                Vec::new()
            }
            Err(e) => {
                warn!("fallback listing task failed for {}: {}", path.display(), e);
                Vec::new()
            }
        }
    }
}

// ------------------------------------------------------------------------- //
// Tests
// ------------------------------------------------------------------------- //

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn lists_immediate_child_dirs_alphabetically() {
        let dir: TempDir = TempDir::new().expect("tempdir");
        std::fs::create_dir(dir.path().join("zeta")).unwrap();
        std::fs::create_dir(dir.path().join("alpha")).unwrap();
        std::fs::create_dir_all(dir.path().join("alpha/nested")).unwrap();
        std::fs::write(dir.path().join("file.txt"), b"not a dir").unwrap();

        let m: WalkdirMeasure = WalkdirMeasure;
        let dirs: Vec<PathBuf> = m.list_child_dirs(dir.path()).await;
        assert_eq!(
            dirs,
            vec![dir.path().join("alpha"), dir.path().join("zeta")]
        );
    }

    #[tokio::test]
    async fn missing_path_measures_as_zero() {
        let m: WalkdirMeasure = WalkdirMeasure;
        let kb: u64 = m.measure_kb(Path::new("/no/such/path/anywhere")).await;
        assert_eq!(kb, 0);
    }

    #[tokio::test]
    async fn missing_path_lists_empty() {
        let m: WalkdirMeasure = WalkdirMeasure;
        let dirs = m.list_child_dirs(Path::new("/no/such/path/anywhere")).await;
        assert!(dirs.is_empty());
    }

    #[tokio::test]
    async fn measures_written_data() {
        let dir: TempDir = TempDir::new().expect("tempdir");
        std::fs::write(dir.path().join("blob"), vec![0u8; 64 * 1024]).unwrap();

        let m: WalkdirMeasure = WalkdirMeasure;
        let kb: u64 = m.measure_kb(dir.path()).await;
        // Block-allocation total, so at least the written payload.
        assert!(kb >= 64, "expected >= 64 KiB, got {kb}");
    }
}
