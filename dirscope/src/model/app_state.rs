//! src/model/app_state.rs
//! ============================================================================
//! # AppState: Owned Application State and Action Handling
//!
//! `AppState` owns the directory cache, the scan coordinator and the
//! navigation state, and is the only place that mutates them. The event loop
//! feeds it one `Action` at a time; background tasks never touch state
//! directly, they send completions through the action channel. Every scan
//! completion is gated on its sequence token still being the newest for its
//! path, so late results from superseded scans are dropped here.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::cache::dir_cache::{DirCache, DirEntryState, SizedChild};
use crate::config::config::Config;
use crate::controller::actions::Action;
use crate::error::AppError;
use crate::fs::measure::Measure;
use crate::model::nav_state::{Mode, NavState};
use crate::persist::store::{PersistedEntry, ScanStore};
use crate::scan::coordinator::ScanCoordinator;
use crate::view::ui::CHROME_ROWS;

#[cfg(target_os = "macos")]
const OPENER: &str = "open";
#[cfg(not(target_os = "macos"))]
const OPENER: &str = "xdg-open";

pub struct AppState {
    pub config: Arc<Config>,
    pub cache: DirCache,
    pub coordinator: ScanCoordinator,
    pub nav: NavState,
    pub measure: Arc<dyn Measure>,
    pub store: Arc<ScanStore>,
    pub action_tx: mpsc::UnboundedSender<Action>,
    pub redraw: bool,
    /// Worker-pool progress for the current path's running scan.
    pub progress: Option<(usize, usize)>,
    pub last_error: Option<String>,
    pub last_status: Option<String>,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        measure: Arc<dyn Measure>,
        store: Arc<ScanStore>,
        action_tx: mpsc::UnboundedSender<Action>,
        start_path: PathBuf,
        window: usize,
    ) -> Self {
        let coordinator: ScanCoordinator = ScanCoordinator::new(
            Arc::clone(&measure),
            action_tx.clone(),
            config.concurrency,
            config.progress_interval,
        );
        AppState {
            cache: DirCache::new(config.top_n),
            coordinator,
            nav: NavState::new(start_path, window),
            config,
            measure,
            store,
            action_tx,
            redraw: true,
            progress: None,
            last_error: None,
            last_status: None,
        }
    }

    /// Seed the cache from the persistence store and kick off the first
    /// visit. Hydrated entries render immediately; unvisited ones scan.
    pub async fn startup(&mut self) {
        let persisted = self.store.load().await;
        self.cache.hydrate(persisted);
        let start: PathBuf = self.nav.current_path.clone();
        self.visit(&start, false);
    }

    pub fn current_entry(&self) -> Option<&DirEntryState> {
        self.cache.get(&self.nav.current_path)
    }

    /// The selectable list for the current directory.
    pub fn navigable(&self) -> Vec<PathBuf> {
        self.current_entry()
            .map(|entry| entry.navigable())
            .unwrap_or_default()
    }

    pub fn selected_path(&self) -> Option<PathBuf> {
        self.navigable().get(self.nav.selected).cloned()
    }

    fn set_error(&mut self, msg: impl Into<String>) {
        let msg: String = msg.into();
        warn!("error surfaced: {}", msg);
        self.last_error = Some(msg);
        self.redraw = true;
    }

    fn set_status(&mut self, msg: impl Into<String>) {
        self.last_status = Some(msg.into());
        self.redraw = true;
    }

    /// Ensure a cache entry for `path` and trigger its scan.
    pub fn visit(&mut self, path: &Path, force: bool) {
        if self.cache.ensure(path) {
            // Listing is populated asynchronously and independently of sizing.
            let measure: Arc<dyn Measure> = Arc::clone(&self.measure);
            let tx: mpsc::UnboundedSender<Action> = self.action_tx.clone();
            let target: PathBuf = path.to_path_buf();
            tokio::spawn(async move {
                let children: Vec<PathBuf> = measure.list_child_dirs(&target).await;
                let _ = tx.send(Action::ChildListing {
                    path: target,
                    children,
                });
            });
        }
        self.coordinator.trigger_scan(&mut self.cache, path, force);
        self.redraw = true;
    }

    /// Apply one event. The single entry point for all state mutation.
    pub fn apply(&mut self, action: Action) {
        match action {
            Action::Quit => {}
            Action::Resize(_cols, rows) => {
                self.nav
                    .set_window(rows.saturating_sub(CHROME_ROWS) as usize);
                self.redraw = true;
            }

            Action::MoveSelectionUp => {
                let len: usize = self.navigable().len();
                self.nav.move_up(len);
                self.redraw = true;
            }
            Action::MoveSelectionDown => {
                let len: usize = self.navigable().len();
                self.nav.move_down(len);
                self.redraw = true;
            }
            Action::JumpTop => {
                self.nav.jump_top();
                self.redraw = true;
            }
            Action::JumpBottom => {
                let len: usize = self.navigable().len();
                self.nav.jump_bottom(len);
                self.redraw = true;
            }

            Action::EnterSelected => self.enter_selected(),
            Action::GoToParent => self.go_to_parent(),
            Action::Rescan => {
                let current: PathBuf = self.nav.current_path.clone();
                self.progress = None;
                self.nav.pending_reselect = None;
                self.visit(&current, true);
            }
            Action::OpenSelected => self.open_selected(),

            Action::RequestDelete => self.request_delete(),
            Action::ConfirmDelete => self.confirm_delete(),
            Action::CancelDelete => {
                if matches!(self.nav.mode, Mode::ConfirmingDelete { .. }) {
                    self.nav.mode = Mode::Browsing;
                    self.last_error = None;
                    self.redraw = true;
                }
            }
            Action::DeleteFinished { path, result } => self.on_delete_finished(path, result),

            Action::ChildListing { path, children } => self.on_child_listing(path, children),
            Action::ScanProgress {
                path,
                token,
                processed,
                total,
            } => {
                if self.coordinator.is_current(&path, token) && path == self.nav.current_path {
                    self.progress = Some((processed, total));
                    self.redraw = true;
                }
            }
            Action::ScanFinished {
                path,
                token,
                children,
            } => self.on_scan_finished(path, token, children),
            Action::ScanFailed {
                path,
                token,
                message,
            } => {
                if self.coordinator.is_current(&path, token) {
                    self.cache.mark_failed(&path, message.clone());
                    self.progress = None;
                    self.set_error(message);
                }
            }
            Action::SelfSizeMeasured {
                path,
                token,
                size_kb,
            } => {
                if self.coordinator.is_current(&path, token) {
                    self.cache.set_own_size(&path, size_kb);
                    self.redraw = true;
                }
            }
        }
    }

    // --------------------------------------------------------------------- //
    // Browsing transitions
    // --------------------------------------------------------------------- //

    fn enter_selected(&mut self) {
        let Some(target) = self.selected_path() else {
            self.set_status("Nothing selected.");
            return;
        };
        info!("entering {}", target.display());
        self.nav.current_path = target.clone();
        self.nav.reset_cursor();
        self.nav.pending_reselect = None;
        self.progress = None;
        self.visit(&target, true);
    }

    fn go_to_parent(&mut self) {
        let current: PathBuf = self.nav.current_path.clone();
        let Some(parent) = current.parent().map(Path::to_path_buf) else {
            self.set_status("Already at filesystem root.");
            return;
        };
        info!("up to {}", parent.display());
        self.nav.current_path = parent.clone();
        self.nav.reset_cursor();
        self.progress = None;
        self.visit(&parent, true);

        // Land on the child we just left, now or when its list arrives.
        let list: Vec<PathBuf> = self.navigable();
        if self.nav.reselect(&list, &current) {
            self.nav.pending_reselect = None;
        } else {
            self.nav.pending_reselect = Some(current);
        }
    }

    fn open_selected(&mut self) {
        let mut target: PathBuf = self
            .selected_path()
            .unwrap_or_else(|| self.nav.current_path.clone());
        if !target.is_dir()
            && let Some(parent) = target.parent()
        {
            target = parent.to_path_buf();
        }
        info!("opening {} via {}", target.display(), OPENER);
        self.set_status(format!("Opened {}", target.display()));
        tokio::spawn(async move {
            if let Err(e) = tokio::process::Command::new(OPENER)
                .arg(&target)
                .spawn()
            {
                warn!("failed to open {}: {}", target.display(), e);
            }
        });
    }

    // --------------------------------------------------------------------- //
    // Delete-confirmation flow
    // --------------------------------------------------------------------- //

    fn request_delete(&mut self) {
        let Some(target) = self.selected_path() else {
            self.set_status("Nothing selected to delete.");
            return;
        };
        self.nav.mode = Mode::ConfirmingDelete { target };
        self.redraw = true;
    }

    fn confirm_delete(&mut self) {
        // Only a pending confirmation may start a deletion; a repeated
        // confirm while one is in flight falls through the match.
        let Mode::ConfirmingDelete { target } = self.nav.mode.clone() else {
            return;
        };
        self.nav.mode = Mode::Deleting {
            target: target.clone(),
        };
        self.redraw = true;
        crate::tasks::delete_task::spawn_delete(target, self.action_tx.clone());
    }

    fn on_delete_finished(&mut self, path: PathBuf, result: Result<(), String>) {
        let Mode::Deleting { target } = self.nav.mode.clone() else {
            return;
        };
        if target != path {
            return;
        }

        match result {
            Ok(()) => {
                self.cache.remove(&path);
                let store: Arc<ScanStore> = Arc::clone(&self.store);
                let forget: PathBuf = path.clone();
                tokio::spawn(async move {
                    if let Err(e) = store.forget(&forget).await {
                        warn!("failed to drop {} from store: {}", forget.display(), e);
                    }
                });

                self.nav.mode = Mode::Browsing;
                self.nav.pending_reselect = None;
                if path == self.nav.current_path {
                    if let Some(parent) = path.parent().map(Path::to_path_buf) {
                        self.nav.current_path = parent;
                    }
                    self.nav.reset_cursor();
                } else {
                    let len: usize = self.navigable().len();
                    self.nav.clamp(len);
                }
                self.set_status(format!("Deleted {}", path.display()));
                let current: PathBuf = self.nav.current_path.clone();
                self.visit(&current, true);
            }
            Err(message) => {
                // Stay in the confirmation so the user may retry or cancel.
                self.nav.mode = Mode::ConfirmingDelete { target };
                self.set_error(message);
            }
        }
    }

    // --------------------------------------------------------------------- //
    // Scan completions (token-gated)
    // --------------------------------------------------------------------- //

    fn on_child_listing(&mut self, path: PathBuf, children: Vec<PathBuf>) {
        self.cache.set_children(&path, children);
        if path == self.nav.current_path {
            self.refresh_current_list();
            // The listing is authoritative for what exists here: a reselect
            // target it does not contain is gone and must not fire later.
            self.nav.pending_reselect = None;
        }
        self.redraw = true;
    }

    fn on_scan_finished(&mut self, path: PathBuf, token: u64, children: Vec<SizedChild>) {
        if !self.coordinator.is_current(&path, token) {
            info!(
                "discarding stale scan {} for {}",
                token,
                path.display()
            );
            return;
        }
        self.cache.commit_scan(&path, children, Utc::now());
        self.persist(&path);
        if path == self.nav.current_path {
            self.progress = None;
            // A committed scan supersedes any previously surfaced failure.
            self.last_error = None;
            self.refresh_current_list();
        }
        self.redraw = true;
    }

    /// Write-through persistence, fire-and-forget: a store failure never
    /// affects in-memory state.
    fn persist(&mut self, path: &Path) {
        let Some(entry) = self.cache.get(path) else {
            return;
        };
        let Some(last_scan) = entry.last_scan else {
            return;
        };
        let persisted: PersistedEntry = PersistedEntry {
            last_scan,
            sized_children: entry.sized_children.clone(),
            child_paths: Vec::new(),
        };
        let store: Arc<ScanStore> = Arc::clone(&self.store);
        let target: PathBuf = path.to_path_buf();
        tokio::spawn(async move {
            if let Err(e) = store.save(&target, persisted).await {
                warn!("failed to persist scan for {}: {}", target.display(), e);
            }
        });
    }

    /// Clamp the selection to the (possibly changed) navigable list and
    /// apply any pending parent re-selection.
    fn refresh_current_list(&mut self) {
        let list: Vec<PathBuf> = self.navigable();
        self.nav.clamp(list.len());
        if let Some(child) = self.nav.pending_reselect.clone()
            && self.nav.reselect(&list, &child)
        {
            self.nav.pending_reselect = None;
        }
    }
}

/// Resolve the directory the explorer starts in: CLI target, then config,
/// then the process working directory.
pub fn resolve_start_path(
    cli_target: Option<PathBuf>,
    config: &Config,
) -> Result<PathBuf, AppError> {
    let raw: PathBuf = match cli_target.or_else(|| config.start_path.clone()) {
        Some(path) => path,
        None => std::env::current_dir()?,
    };
    Ok(std::fs::canonicalize(&raw)?)
}

// ------------------------------------------------------------------------- //
// Tests
// ------------------------------------------------------------------------- //
