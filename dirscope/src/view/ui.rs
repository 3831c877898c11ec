//! src/view/ui.rs
//! ============================================================================
//! # View: Thin List + Status Bar Render
//!
//! Deliberately minimal: a header with the current path, the navigable list
//! windowed by the viewport, and a status line. The view only reads state;
//! it subscribes to mutations through the `redraw` flag the event loop
//! checks each iteration.

use bytesize::ByteSize;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::Line,
    widgets::{List, ListItem, Paragraph},
};
use std::path::PathBuf;

use crate::model::app_state::AppState;
use crate::model::nav_state::Mode;

/// Rows reserved for header and status chrome; the viewport window is the
/// terminal height minus this.
pub const CHROME_ROWS: u16 = 3;

pub struct View;

impl View {
    /// Draws the full UI for one frame; called in `terminal.draw(|frame| ...)`.
    pub fn redraw(frame: &mut Frame<'_>, app: &AppState) {
        let chunks: Vec<Rect> = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(1),
                Constraint::Length(2),
            ])
            .split(frame.area())
            .to_vec();

        Self::render_header(frame, app, chunks[0]);
        Self::render_list(frame, app, chunks[1]);
        Self::render_status(frame, app, chunks[2]);
    }

    fn render_header(frame: &mut Frame<'_>, app: &AppState, area: Rect) {
        let own_size: String = app
            .current_entry()
            .and_then(|e| e.size_kb)
            .map(|kb| format!("  [{}]", ByteSize::kib(kb)))
            .unwrap_or_default();
        let header: String = format!("{}{}", app.nav.current_path.display(), own_size);
        frame.render_widget(
            Paragraph::new(header).style(Style::default().add_modifier(Modifier::BOLD)),
            area,
        );
    }

    fn render_list(frame: &mut Frame<'_>, app: &AppState, area: Rect) {
        let list: Vec<PathBuf> = app.navigable();
        let entry = app.current_entry();
        let window: usize = app.nav.window;
        let offset: usize = app.nav.offset;

        let items: Vec<ListItem> = list
            .iter()
            .enumerate()
            .skip(offset)
            .take(window)
            .map(|(index, path)| {
                let name: String = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                let size: String = entry
                    .and_then(|e| e.child_size_kb(path))
                    .map(|kb| format!("{:>10}", ByteSize::kib(kb).to_string()))
                    .unwrap_or_else(|| format!("{:>10}", "-"));
                let line: Line = Line::from(format!(" {size}  {name}"));
                let item: ListItem = ListItem::new(line);
                if index == app.nav.selected {
                    item.style(Style::default().add_modifier(Modifier::REVERSED))
                } else {
                    item
                }
            })
            .collect();

        frame.render_widget(List::new(items), area);
    }

    fn render_status(frame: &mut Frame<'_>, app: &AppState, area: Rect) {
        let line: String = match &app.nav.mode {
            Mode::ConfirmingDelete { target } => {
                format!("Delete {} recursively? [y/n]", target.display())
            }
            Mode::Deleting { target } => format!("Deleting {}…", target.display()),
            Mode::Browsing => {
                if let Some(err) = &app.last_error {
                    format!("error: {err}")
                } else if let Some((processed, total)) = app.progress {
                    format!("scanning… {processed}/{total}")
                } else if let Some(status) = &app.last_status {
                    status.clone()
                } else {
                    String::from(
                        "↑/↓ select  ⏎ enter  ←/b up  r rescan  o open  d delete  q quit",
                    )
                }
            }
        };
        frame.render_widget(Paragraph::new(line), area);
    }
}
