//! lib.rs — Library Entry for the dirscope Size Explorer
//! -----------------------------------------------
//! Explicitly exposes the cache, scan, model, and controller modules.
//! Only re-export what you want public in the library crate root.

/// --- Error handling (unified error type for app) ---
pub mod error;

/// --- Command-line surface (interactive default + one-shot report) ---
pub mod cli;
pub mod report;

/// --- Directory cache: the single source of truth for rendered state ---
pub mod cache {
    pub mod dir_cache;
}

/// --- Persistence: durable scan results across sessions ---
pub mod persist {
    pub mod store;
}

/// --- Configuration: scan tuning, backend selection, start path ---
pub mod config {
    pub mod config;
}

/// --- Controller/event loop (main async event handling) ---
pub mod controller {
    pub mod actions;
    pub mod event_loop;
}

/// --- State/data models ---
pub mod model {
    pub mod app_state;
    pub mod nav_state;
}

/// --- Filesystem measurement capability ---
pub mod fs {
    pub mod measure;
}

/// --- Scan orchestration (worker pool, sequence tokens) ---
pub mod scan {
    pub mod coordinator;
}

/// --- Background/async tasks ---
pub mod tasks {
    pub mod delete_task;
}

/// --- UI rendering (thin list + status bar view) ---
pub mod view {
    pub mod ui;
}

pub mod logging;
pub use logging::Logger;

/// --- Crate-level re-exports for the most important types ---
pub use cache::dir_cache::{DirCache, DirEntryState, ScanStatus, SizedChild};
pub use error::AppError;
pub use model::{app_state::AppState, nav_state::NavState};
