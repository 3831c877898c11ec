//! src/model/nav_state.rs
//! ============================================================================
//! # NavState: Cursor, Viewport and Delete-Confirmation Modes
//!
//! Pure navigation state over the current directory's navigable list. The
//! list itself lives in the cache; this struct only tracks which path is
//! current, which index is selected, and the scroll offset of the visible
//! window. The three modes drive the keyboard dispatch: `Browsing`,
//! `ConfirmingDelete` (holding the pending target), and `Deleting` while a
//! removal is in flight.

use std::path::{Path, PathBuf};

/// Interaction mode of the navigation state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Browsing,
    ConfirmingDelete { target: PathBuf },
    Deleting { target: PathBuf },
}

#[derive(Debug, Clone)]
pub struct NavState {
    pub current_path: PathBuf,
    pub selected: usize,
    /// First visible row of the viewport.
    pub offset: usize,
    /// Visible rows, terminal height minus reserved chrome.
    pub window: usize,
    pub mode: Mode,
    /// Child to re-select once the parent's list is available after
    /// navigating upward.
    pub pending_reselect: Option<PathBuf>,
}

impl NavState {
    pub fn new(start: PathBuf, window: usize) -> Self {
        NavState {
            current_path: start,
            selected: 0,
            offset: 0,
            window: window.max(1),
            mode: Mode::Browsing,
            pending_reselect: None,
        }
    }

    /// Reset cursor and viewport when entering a different directory.
    pub fn reset_cursor(&mut self) {
        self.selected = 0;
        self.offset = 0;
    }

    pub fn move_up(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        self.selected = if self.selected == 0 {
            len - 1
        } else {
            self.selected - 1
        };
        self.scroll_into_view();
    }

    pub fn move_down(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        self.selected = (self.selected + 1) % len;
        self.scroll_into_view();
    }

    pub fn jump_top(&mut self) {
        self.selected = 0;
        self.scroll_into_view();
    }

    pub fn jump_bottom(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        self.selected = len - 1;
        self.scroll_into_view();
    }

    /// Keep the selection valid after the navigable list changed length.
    pub fn clamp(&mut self, len: usize) {
        if len == 0 {
            self.selected = 0;
            self.offset = 0;
            return;
        }
        if self.selected >= len {
            self.selected = len - 1;
        }
        self.scroll_into_view();
    }

    /// Select `child` if it appears in `list`; used when returning to a
    /// parent directory.
    pub fn reselect(&mut self, list: &[PathBuf], child: &Path) -> bool {
        if let Some(index) = list.iter().position(|p| p == child) {
            self.selected = index;
            self.scroll_into_view();
            true
        } else {
            false
        }
    }

    pub fn set_window(&mut self, window: usize) {
        self.window = window.max(1);
        self.scroll_into_view();
    }

    /// Minimal scroll that restores visibility: scroll up to the selection
    /// when it is above the window, down by exactly the overshoot when below,
    /// otherwise leave the offset alone.
    fn scroll_into_view(&mut self) {
        if self.selected < self.offset {
            self.offset = self.selected;
        } else if self.selected >= self.offset + self.window {
            self.offset = self.selected - self.window + 1;
        }
    }
}

// ------------------------------------------------------------------------- //
// Tests
// ------------------------------------------------------------------------- //

#[cfg(test)]
mod tests {
    use super::*;

    fn nav(window: usize) -> NavState {
        NavState::new(PathBuf::from("/root"), window)
    }

    #[test]
    fn selection_wraps_both_directions() {
        let mut n: NavState = nav(10);
        n.move_up(5);
        assert_eq!(n.selected, 4);
        n.move_down(5);
        assert_eq!(n.selected, 0);
        n.move_down(5);
        assert_eq!(n.selected, 1);
    }

    #[test]
    fn empty_list_ignores_movement() {
        let mut n: NavState = nav(10);
        n.move_down(0);
        n.move_up(0);
        n.jump_bottom(0);
        assert_eq!(n.selected, 0);
        assert_eq!(n.offset, 0);
    }

    #[test]
    fn viewport_scrolls_minimally_downward() {
        let mut n: NavState = nav(5);
        for _ in 0..7 {
            n.move_down(20);
        }
        assert_eq!(n.selected, 7);
        // Window shows rows [3, 7]: one-past scroll, never overshoot.
        assert_eq!(n.offset, 3);
    }

    #[test]
    fn viewport_scrolls_minimally_upward() {
        let mut n: NavState = nav(5);
        n.jump_bottom(20);
        assert_eq!(n.offset, 15);
        n.jump_top();
        assert_eq!(n.offset, 0);

        n.jump_bottom(20);
        // Moving to a row just above the window scrolls up exactly to it.
        n.selected = 14;
        n.clamp(20);
        assert_eq!(n.offset, 14);
    }

    #[test]
    fn selection_stays_put_inside_window() {
        let mut n: NavState = nav(10);
        n.move_down(20);
        n.move_down(20);
        assert_eq!(n.offset, 0);
    }

    #[test]
    fn clamp_after_list_shrinks() {
        let mut n: NavState = nav(5);
        n.jump_bottom(12);
        assert_eq!(n.selected, 11);
        n.clamp(3);
        assert_eq!(n.selected, 2);
        n.clamp(0);
        assert_eq!(n.selected, 0);
        assert_eq!(n.offset, 0);
    }

    #[test]
    fn wraparound_to_bottom_scrolls_viewport() {
        let mut n: NavState = nav(5);
        n.move_up(20);
        assert_eq!(n.selected, 19);
        assert_eq!(n.offset, 15);
    }

    #[test]
    fn reselect_finds_departed_child() {
        let mut n: NavState = nav(5);
        let list: Vec<PathBuf> = (0..8).map(|i| PathBuf::from(format!("/p/c{i}"))).collect();
        assert!(n.reselect(&list, Path::new("/p/c6")));
        assert_eq!(n.selected, 6);
        assert_eq!(n.offset, 2);
        assert!(!n.reselect(&list, Path::new("/p/gone")));
        assert_eq!(n.selected, 6);
    }

    #[test]
    fn shrinking_window_pulls_selection_back_into_view() {
        let mut n: NavState = nav(10);
        n.jump_bottom(9);
        assert_eq!(n.offset, 0);
        n.set_window(4);
        assert_eq!(n.offset, 5);
    }
}
