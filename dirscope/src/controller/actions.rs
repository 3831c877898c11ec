//! src/controller/actions.rs
//! ============================================================================
//! # Actions: Centralized Application Commands
//!
//! The `Action` enum represents every discrete event the application reacts
//! to: user commands decoded from key presses, and completions reported by
//! background tasks. All cache and navigation mutation happens while the
//! event loop applies one of these, which is what keeps the shared state a
//! single-writer system.

use std::path::PathBuf;

use crate::cache::dir_cache::SizedChild;

/// A high-level command or task completion processed by the event loop.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// A terminal resize event (columns, rows).
    Resize(u16, u16),
    /// Quit the application.
    Quit,

    // -- browsing commands -------------------------------------------------
    /// Move selection up, wrapping at the top.
    MoveSelectionUp,
    /// Move selection down, wrapping at the bottom.
    MoveSelectionDown,
    /// Jump to the first entry.
    JumpTop,
    /// Jump to the last entry.
    JumpBottom,
    /// Enter the selected child directory.
    EnterSelected,
    /// Go to the parent directory.
    GoToParent,
    /// Force-rescan the current directory.
    Rescan,
    /// Open the selection in the system file manager.
    OpenSelected,
    /// Ask for confirmation before deleting the selection.
    RequestDelete,

    // -- delete confirmation flow ------------------------------------------
    ConfirmDelete,
    CancelDelete,
    /// A background deletion finished (`Err` carries the message).
    DeleteFinished {
        path: PathBuf,
        result: Result<(), String>,
    },

    // -- scan task completions ---------------------------------------------
    /// A child listing arrived for a cached entry.
    ChildListing {
        path: PathBuf,
        children: Vec<PathBuf>,
    },
    /// Throttled worker-pool progress for a scan generation.
    ScanProgress {
        path: PathBuf,
        token: u64,
        processed: usize,
        total: usize,
    },
    /// A scan generation completed; results are unsorted.
    ScanFinished {
        path: PathBuf,
        token: u64,
        children: Vec<SizedChild>,
    },
    /// Scan orchestration failed (not a per-child measurement error).
    ScanFailed {
        path: PathBuf,
        token: u64,
        message: String,
    },
    /// Post-scan refresh of the scanned directory's own size.
    SelfSizeMeasured {
        path: PathBuf,
        token: u64,
        size_kb: u64,
    },
}
