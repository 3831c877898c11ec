//! src/controller/event_loop.rs
//! ============================================================================
//! # Controller: Terminal Events → Actions
//!
//! Bridges crossterm's blocking event source into the async loop and decodes
//! key presses into semantic actions. Decoding is mode-aware: while a delete
//! confirmation is pending only confirm/cancel keys mean anything, and while
//! a deletion runs all input is ignored until the completion arrives.

use crossterm::event::{self, Event as TermEvent, KeyCode, KeyEvent, KeyEventKind};
use tokio::sync::mpsc;

use crate::controller::actions::Action;
use crate::model::nav_state::Mode;

pub struct Controller {
    pub action_rx: mpsc::UnboundedReceiver<Action>,
}

impl Controller {
    pub fn new(action_rx: mpsc::UnboundedReceiver<Action>) -> Self {
        Controller { action_rx }
    }

    /// Waits asynchronously for the next terminal event (keyboard, resize).
    /// Uses crossterm's nonblocking poll and integrates with Tokio via
    /// spawn_blocking. Associated so the caller can select over it and the
    /// action receiver at the same time.
    pub async fn next_terminal_event() -> Option<TermEvent> {
        tokio::task::spawn_blocking(|| {
            if event::poll(std::time::Duration::from_millis(100)).unwrap_or(false) {
                event::read().ok()
            } else {
                None
            }
        })
        .await
        .ok()
        .flatten()
    }

    /// Receive the next background-task completion.
    pub async fn next_task_action(&mut self) -> Option<Action> {
        self.action_rx.recv().await
    }

    /// Decode a terminal event for the given interaction mode.
    pub fn decode(mode: &Mode, event: TermEvent) -> Option<Action> {
        match event {
            TermEvent::Key(key) if key.kind == KeyEventKind::Press => Self::decode_key(mode, key),
            TermEvent::Resize(cols, rows) => Some(Action::Resize(cols, rows)),
            _ => None,
        }
    }

    fn decode_key(mode: &Mode, key: KeyEvent) -> Option<Action> {
        match mode {
            Mode::Browsing => match key.code {
                KeyCode::Up | KeyCode::Char('k') => Some(Action::MoveSelectionUp),
                KeyCode::Down | KeyCode::Char('j') => Some(Action::MoveSelectionDown),
                KeyCode::Right | KeyCode::Enter | KeyCode::Char(' ') => {
                    Some(Action::EnterSelected)
                }
                KeyCode::Left | KeyCode::Char('b') => Some(Action::GoToParent),
                KeyCode::Char('g') => Some(Action::JumpTop),
                KeyCode::Char('G') => Some(Action::JumpBottom),
                KeyCode::Char('r') => Some(Action::Rescan),
                KeyCode::Char('o') => Some(Action::OpenSelected),
                KeyCode::Char('d') => Some(Action::RequestDelete),
                KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
                _ => None,
            },
            Mode::ConfirmingDelete { .. } => match key.code {
                KeyCode::Char('y') | KeyCode::Enter => Some(Action::ConfirmDelete),
                KeyCode::Char('n') | KeyCode::Esc => Some(Action::CancelDelete),
                _ => None,
            },
            // Input is inert while a deletion is in flight.
            Mode::Deleting { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use std::path::PathBuf;

    fn press(code: KeyCode) -> TermEvent {
        TermEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn browsing_keys_decode_to_navigation() {
        let mode: Mode = Mode::Browsing;
        assert_eq!(
            Controller::decode(&mode, press(KeyCode::Char('j'))),
            Some(Action::MoveSelectionDown)
        );
        assert_eq!(
            Controller::decode(&mode, press(KeyCode::Enter)),
            Some(Action::EnterSelected)
        );
        assert_eq!(
            Controller::decode(&mode, press(KeyCode::Char('b'))),
            Some(Action::GoToParent)
        );
        assert_eq!(
            Controller::decode(&mode, press(KeyCode::Char('G'))),
            Some(Action::JumpBottom)
        );
        assert_eq!(
            Controller::decode(&mode, press(KeyCode::Esc)),
            Some(Action::Quit)
        );
    }

    #[test]
    fn confirmation_only_accepts_confirm_or_cancel() {
        let mode: Mode = Mode::ConfirmingDelete {
            target: PathBuf::from("/x"),
        };
        assert_eq!(
            Controller::decode(&mode, press(KeyCode::Char('y'))),
            Some(Action::ConfirmDelete)
        );
        assert_eq!(
            Controller::decode(&mode, press(KeyCode::Esc)),
            Some(Action::CancelDelete)
        );
        assert_eq!(Controller::decode(&mode, press(KeyCode::Char('j'))), None);
        assert_eq!(Controller::decode(&mode, press(KeyCode::Char('q'))), None);
    }

    #[test]
    fn deleting_mode_swallows_all_keys() {
        let mode: Mode = Mode::Deleting {
            target: PathBuf::from("/x"),
        };
        assert_eq!(Controller::decode(&mode, press(KeyCode::Char('y'))), None);
        assert_eq!(Controller::decode(&mode, press(KeyCode::Enter)), None);
        assert_eq!(Controller::decode(&mode, press(KeyCode::Esc)), None);
    }

    #[test]
    fn resize_decodes_in_every_mode() {
        for mode in [
            Mode::Browsing,
            Mode::ConfirmingDelete {
                target: PathBuf::from("/x"),
            },
            Mode::Deleting {
                target: PathBuf::from("/x"),
            },
        ] {
            assert_eq!(
                Controller::decode(&mode, TermEvent::Resize(80, 24)),
                Some(Action::Resize(80, 24))
            );
        }
    }
}
