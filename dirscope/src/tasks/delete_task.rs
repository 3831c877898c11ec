//! src/tasks/delete_task.rs
//! ============================================================================
//! # Delete Task: Background Recursive Removal
//!
//! Spawns a Tokio task that force-removes a subtree and reports the outcome
//! back to the event loop as `Action::DeleteFinished`. The navigation state
//! machine stays in `Deleting` until that action arrives, which is what makes
//! a rapid repeated confirm a no-op rather than a second removal.

use std::path::PathBuf;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::controller::actions::Action;

/// Recursively delete `target` and report completion.
pub fn spawn_delete(target: PathBuf, action_tx: mpsc::UnboundedSender<Action>) {
    info!("spawning recursive delete for {}", target.display());

    tokio::spawn(async move {
        let result: Result<(), String> = tokio::fs::remove_dir_all(&target)
            .await
            .map_err(|e| e.to_string());

        if let Err(message) = &result {
            warn!("delete failed for {}: {}", target.display(), message);
        }
        let action: Action = Action::DeleteFinished {
            path: target,
            result,
        };
        if let Err(e) = action_tx.send(action) {
            warn!("failed to report delete completion: {}", e);
        }
    });
}
