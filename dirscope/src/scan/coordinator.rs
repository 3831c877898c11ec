//! src/scan/coordinator.rs
//! ============================================================================
//! # ScanCoordinator: One Scan Generation Per Path
//!
//! Orchestrates directory scans over the measurement capability. Each
//! triggered scan gets a process-global, monotonically increasing sequence
//! token; only results carrying the latest token for their path may be
//! committed, which is how late completions from superseded scans are
//! discarded without locks. The coordinator never mutates the cache from a
//! background task: workers report through the action channel and the event
//! loop commits after re-validating the token.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cache::dir_cache::{DirCache, ScanStatus, SizedChild};
use crate::controller::actions::Action;
use crate::fs::measure::Measure;

pub struct ScanCoordinator {
    measure: Arc<dyn Measure>,
    action_tx: mpsc::UnboundedSender<Action>,
    concurrency: usize,
    progress_interval: Duration,
    next_token: u64,
    /// Latest issued token per path; the commit gate.
    latest: HashMap<PathBuf, u64>,
}

impl ScanCoordinator {
    pub fn new(
        measure: Arc<dyn Measure>,
        action_tx: mpsc::UnboundedSender<Action>,
        concurrency: usize,
        progress_interval: Duration,
    ) -> Self {
        ScanCoordinator {
            measure,
            action_tx,
            concurrency: concurrency.max(1),
            progress_interval,
            next_token: 0,
            latest: HashMap::new(),
        }
    }

    /// True when `token` is still the newest scan generation for `path`.
    /// Every continuation must pass this gate before mutating shared state.
    pub fn is_current(&self, path: &Path, token: u64) -> bool {
        self.latest.get(path).copied() == Some(token)
    }

    pub fn latest_token(&self, path: &Path) -> Option<u64> {
        self.latest.get(path).copied()
    }

    /// Start a scan for `path`. Unforced triggers are a no-op when the entry
    /// is already `Scanned` or a scan is in flight; a forced trigger always
    /// issues a fresh token, superseding any running generation. Returns the
    /// issued token when a scan was started.
    pub fn trigger_scan(&mut self, cache: &mut DirCache, path: &Path, force: bool) -> Option<u64> {
        if !force
            && let Some(entry) = cache.get(path)
            && matches!(entry.status, ScanStatus::Scanned | ScanStatus::Scanning)
        {
            debug!("scan no-op for {} (status {:?})", path.display(), entry.status);
            return None;
        }

        self.next_token += 1;
        let token: u64 = self.next_token;
        self.latest.insert(path.to_path_buf(), token);
        cache.mark_scanning(path);
        info!("scan token {} issued for {}", token, path.display());

        let measure: Arc<dyn Measure> = Arc::clone(&self.measure);
        let tx: mpsc::UnboundedSender<Action> = self.action_tx.clone();
        let target: PathBuf = path.to_path_buf();
        let concurrency: usize = self.concurrency;
        let interval: Duration = self.progress_interval;
        tokio::spawn(async move {
            run_scan(measure, target, token, tx, concurrency, interval).await;
        });

        Some(token)
    }
}

/// One full scan generation: list children, size them through the worker
/// pool, report the result set, then refresh the directory's own size.
async fn run_scan(
    measure: Arc<dyn Measure>,
    path: PathBuf,
    token: u64,
    tx: mpsc::UnboundedSender<Action>,
    concurrency: usize,
    progress_interval: Duration,
) {
    let children: Vec<PathBuf> = measure.list_child_dirs(&path).await;
    let total: usize = children.len();

    let progress_tx = tx.clone();
    let progress_path = path.clone();
    let throttle: Arc<Mutex<Instant>> = Arc::new(Mutex::new(Instant::now()));
    let on_progress: Arc<dyn Fn(usize) + Send + Sync> = Arc::new(move |processed: usize| {
        let mut last = match throttle.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if last.elapsed() >= progress_interval {
            *last = Instant::now();
            let _ = progress_tx.send(Action::ScanProgress {
                path: progress_path.clone(),
                token,
                processed,
                total,
            });
        }
    });

    match size_children(&measure, children, concurrency, Some(on_progress)).await {
        Ok(sized) => {
            // The final progress update is never throttled away.
            let _ = tx.send(Action::ScanProgress {
                path: path.clone(),
                token,
                processed: total,
                total,
            });
            let _ = tx.send(Action::ScanFinished {
                path: path.clone(),
                token,
                children: sized,
            });

            // Post-scan refresh of the directory's own aggregate size; the
            // event loop re-validates the token before applying it.
            let size_kb: u64 = measure.measure_kb(&path).await;
            let _ = tx.send(Action::SelfSizeMeasured {
                path,
                token,
                size_kb,
            });
        }
        Err(message) => {
            warn!("scan {} failed for {}: {}", token, path.display(), message);
            let _ = tx.send(Action::ScanFailed {
                path,
                token,
                message,
            });
        }
    }
}

/// Measure every child concurrently with a fixed-size worker pool. Workers
/// pull indices from a shared cursor until exhausted; each performs one
/// measurement at a time, and completion requires all workers to join.
/// Per-child measurement failure is absorbed as size 0 by the capability;
/// only a worker panic surfaces as an orchestration error.
pub async fn size_children(
    measure: &Arc<dyn Measure>,
    children: Vec<PathBuf>,
    concurrency: usize,
    on_progress: Option<Arc<dyn Fn(usize) + Send + Sync>>,
) -> Result<Vec<SizedChild>, String> {
    if children.is_empty() {
        return Ok(Vec::new());
    }

    let children: Arc<Vec<PathBuf>> = Arc::new(children);
    let cursor: Arc<AtomicUsize> = Arc::new(AtomicUsize::new(0));
    let processed: Arc<AtomicUsize> = Arc::new(AtomicUsize::new(0));
    let workers: usize = concurrency.max(1).min(children.len());

    let mut handles: Vec<tokio::task::JoinHandle<Vec<SizedChild>>> = Vec::with_capacity(workers);
    for _ in 0..workers {
        let measure: Arc<dyn Measure> = Arc::clone(measure);
        let children: Arc<Vec<PathBuf>> = Arc::clone(&children);
        let cursor: Arc<AtomicUsize> = Arc::clone(&cursor);
        let processed: Arc<AtomicUsize> = Arc::clone(&processed);
        let on_progress = on_progress.clone();

        handles.push(tokio::spawn(async move {
            let mut local: Vec<SizedChild> = Vec::new();
            loop {
                let index: usize = cursor.fetch_add(1, Ordering::SeqCst);
                if index >= children.len() {
                    break;
                }
                let child: &PathBuf = &children[index];
                let size_kb: u64 = measure.measure_kb(child).await;
                local.push(SizedChild {
                    path: child.clone(),
                    size_kb,
                });
                let done: usize = processed.fetch_add(1, Ordering::SeqCst) + 1;
                if let Some(cb) = &on_progress {
                    cb(done);
                }
            }
            local
        }));
    }

    let mut sized: Vec<SizedChild> = Vec::with_capacity(children.len());
    for joined in futures::future::join_all(handles).await {
        match joined {
            Ok(local) => sized.extend(local),
            Err(e) => return Err(format!("measurement worker failed: {e}")),
        }
    }
    Ok(sized)
}

// ------------------------------------------------------------------------- //
// Tests
// ------------------------------------------------------------------------- //

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap as StdHashMap;

    /// Deterministic capability with preset sizes and listings.
    struct FakeMeasure {
        sizes: StdHashMap<PathBuf, u64>,
        listings: StdHashMap<PathBuf, Vec<PathBuf>>,
    }

    #[async_trait]
    impl Measure for FakeMeasure {
        async fn measure_kb(&self, path: &Path) -> u64 {
            self.sizes.get(path).copied().unwrap_or(0)
        }

        async fn list_child_dirs(&self, path: &Path) -> Vec<PathBuf> {
            self.listings.get(path).cloned().unwrap_or_default()
        }
    }

    fn fake_with_children(parent: &str, sizes: &[(&str, u64)]) -> Arc<dyn Measure> {
        let mut size_map: StdHashMap<PathBuf, u64> = StdHashMap::new();
        let mut children: Vec<PathBuf> = Vec::new();
        for (name, kb) in sizes {
            let child: PathBuf = PathBuf::from(parent).join(name);
            size_map.insert(child.clone(), *kb);
            children.push(child);
        }
        let mut listings: StdHashMap<PathBuf, Vec<PathBuf>> = StdHashMap::new();
        listings.insert(PathBuf::from(parent), children);
        Arc::new(FakeMeasure {
            sizes: size_map,
            listings,
        })
    }

    #[tokio::test]
    async fn pool_measures_every_child_once() {
        let measure = fake_with_children(
            "/scan",
            &[("a", 10), ("b", 50), ("c", 5), ("d", 200), ("e", 1)],
        );
        let children: Vec<PathBuf> = measure.list_child_dirs(Path::new("/scan")).await;

        let sized = size_children(&measure, children, 3, None)
            .await
            .expect("pool completes");
        assert_eq!(sized.len(), 5);
        let total: u64 = sized.iter().map(|c| c.size_kb).sum();
        assert_eq!(total, 266);
    }

    #[tokio::test]
    async fn pool_handles_more_workers_than_children() {
        let measure = fake_with_children("/scan", &[("only", 42)]);
        let children: Vec<PathBuf> = measure.list_child_dirs(Path::new("/scan")).await;
        let sized = size_children(&measure, children, 6, None)
            .await
            .expect("pool completes");
        assert_eq!(sized.len(), 1);
        assert_eq!(sized[0].size_kb, 42);
    }

    #[tokio::test]
    async fn pool_reports_progress_up_to_total() {
        let measure = fake_with_children("/scan", &[("a", 1), ("b", 2), ("c", 3)]);
        let children: Vec<PathBuf> = measure.list_child_dirs(Path::new("/scan")).await;

        let seen: Arc<Mutex<Vec<usize>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let cb: Arc<dyn Fn(usize) + Send + Sync> =
            Arc::new(move |done| sink.lock().unwrap().push(done));

        size_children(&measure, children, 2, Some(cb))
            .await
            .expect("pool completes");
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(*seen.iter().max().unwrap(), 3);
    }

    #[tokio::test]
    async fn completion_progress_update_bypasses_throttle() {
        let (tx, mut rx) = mpsc::unbounded_channel::<Action>();
        let measure = fake_with_children("/scan", &[("a", 1), ("b", 2), ("c", 3)]);
        // An interval no worker can outlast: every per-child callback lands
        // inside the throttle window and gets suppressed.
        let mut coordinator: ScanCoordinator =
            ScanCoordinator::new(measure, tx, 2, Duration::from_secs(3600));
        let mut cache: DirCache = DirCache::new(30);
        cache.ensure(Path::new("/scan"));
        let token: u64 = coordinator
            .trigger_scan(&mut cache, Path::new("/scan"), false)
            .expect("scan starts");

        let mut progress: Vec<(usize, usize)> = Vec::new();
        loop {
            match rx.recv().await.expect("scan reports") {
                Action::ScanProgress {
                    token: t,
                    processed,
                    total,
                    ..
                } => {
                    assert_eq!(t, token);
                    progress.push((processed, total));
                }
                Action::ScanFinished {
                    token: t, children, ..
                } => {
                    assert_eq!(t, token);
                    assert_eq!(children.len(), 3);
                    break;
                }
                other => panic!("unexpected action before completion: {other:?}"),
            }
        }

        // Only the unconditional completion update survives, and it reports
        // every child processed.
        assert_eq!(progress, vec![(3, 3)]);
    }

    #[tokio::test]
    async fn unforced_trigger_is_noop_on_scanned_entry() {
        let (tx, _rx) = mpsc::unbounded_channel::<Action>();
        let measure = fake_with_children("/scan", &[("a", 1)]);
        let mut coordinator: ScanCoordinator =
            ScanCoordinator::new(measure, tx, 2, Duration::from_millis(150));
        let mut cache: DirCache = DirCache::new(30);
        cache.ensure(Path::new("/scan"));

        let first = coordinator.trigger_scan(&mut cache, Path::new("/scan"), false);
        assert!(first.is_some());
        // Entry is now Scanning; a second unforced trigger must be a no-op.
        let second = coordinator.trigger_scan(&mut cache, Path::new("/scan"), false);
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn forced_trigger_supersedes_running_generation() {
        let (tx, _rx) = mpsc::unbounded_channel::<Action>();
        let measure = fake_with_children("/scan", &[("a", 1)]);
        let mut coordinator: ScanCoordinator =
            ScanCoordinator::new(measure, tx, 2, Duration::from_millis(150));
        let mut cache: DirCache = DirCache::new(30);
        cache.ensure(Path::new("/scan"));

        let first = coordinator
            .trigger_scan(&mut cache, Path::new("/scan"), false)
            .expect("first scan starts");
        let second = coordinator
            .trigger_scan(&mut cache, Path::new("/scan"), true)
            .expect("forced rescan starts");

        assert!(second > first);
        assert!(!coordinator.is_current(Path::new("/scan"), first));
        assert!(coordinator.is_current(Path::new("/scan"), second));
    }
}
