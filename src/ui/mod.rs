mod inbox;
mod popups;
mod reader;
pub mod theme;
mod widgets;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
};

use crate::app::snapshot::Snapshot;
use inbox::{render_info_line, render_list, render_status};
use reader::render_reader;
use widgets::{error_bar, help_bar};

/// Status bar, info line, and help bar each take one row
const CHROME_ROWS: u16 = 3;

/// List rows available in a terminal of the given height
pub fn list_rows(terminal_height: u16) -> usize {
    terminal_height.saturating_sub(CHROME_ROWS).max(1) as usize
}

const INBOX_HINTS: &[(&str, &str)] = &[
    ("j/k", "move"),
    ("Enter", "open"),
    ("x", "select"),
    ("a", "archive"),
    ("d", "trash"),
    ("D", "delete"),
    ("u", "undo"),
    ("m", "read/unread"),
    ("/", "search"),
    ("r", "refresh"),
    ("?", "help"),
    ("q", "quit"),
];

const READER_HINTS: &[(&str, &str)] = &[
    ("j/k", "prev/next"),
    ("Enter", "expand"),
    ("a", "attachments"),
    ("PgUp/PgDn", "scroll"),
    ("m", "read/unread"),
    ("?", "help"),
    ("q/Esc", "back"),
];

const ATTACHMENT_HINTS: &[(&str, &str)] = &[
    ("j/k", "move"),
    ("Enter/d", "download"),
    ("v", "view"),
    ("Esc", "close"),
];

const PREVIEW_HINTS: &[(&str, &str)] = &[("j/k", "scroll"), ("q/Esc", "back")];

const SEARCH_HINTS: &[(&str, &str)] = &[("Enter", "apply"), ("Esc", "cancel")];

/// Key hints for whatever currently has focus
fn hints_for(snap: &Snapshot) -> (&'static str, &'static [(&'static str, &'static str)]) {
    match &snap.reader {
        Some(reader) if reader.preview.is_some() => ("Preview", PREVIEW_HINTS),
        Some(reader) if reader.attachments.is_some() => ("Attachments", ATTACHMENT_HINTS),
        Some(_) => ("Reader", READER_HINTS),
        None if snap.search.editing.is_some() => ("Search", SEARCH_HINTS),
        None => ("Inbox", INBOX_HINTS),
    }
}

pub fn render(frame: &mut Frame, snap: &Snapshot) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Status bar
            Constraint::Min(0),    // List or reader
            Constraint::Length(1), // Prompt, search, or message
            Constraint::Length(1), // Help bar or error
        ])
        .split(frame.area());

    render_status(frame, chunks[0], snap);

    match &snap.reader {
        Some(reader) => render_reader(frame, chunks[1], reader),
        None => render_list(frame, chunks[1], snap),
    }

    render_info_line(frame, chunks[2], snap);

    let (title, hints) = hints_for(snap);
    if let Some(error) = &snap.error {
        error_bar(frame, chunks[3], error);
    } else {
        help_bar(frame, chunks[3], hints);
    }

    if snap.help {
        let area = frame.area();
        popups::render_help(frame, area, &format!("{} keys", title), hints);
    }
}
