//! Immutable view of the state handed to the render thread

use chrono::{Datelike, Local};

use crate::mail::{Message, ThreadKey, ThreadRecord};

use super::reader::{AttachmentPreview, AttachmentsModal};
use super::state::{AppState, InboxStatus, Mode};
use super::undo::thread_count;

#[derive(Debug, Clone, PartialEq)]
pub struct RowView {
    pub key: ThreadKey,
    pub account_name: String,
    pub sender: String,
    pub subject: String,
    pub snippet: String,
    pub time: String,
    pub unread: bool,
    pub selected: bool,
    pub loaded: bool,
    pub search_only: bool,
    pub has_attachment: bool,
    pub message_count: usize,
    pub focused: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchView {
    pub query: String,
    /// Prompt text while the search line is being edited
    pub editing: Option<String>,
    pub remote_loading: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReaderView {
    pub subject: String,
    pub messages: Vec<Message>,
    /// Parallel to `messages`
    pub expanded: Vec<bool>,
    pub selected: usize,
    pub loading: bool,
    pub scroll: usize,
    pub attachments: Option<AttachmentsModal>,
    pub preview: Option<AttachmentPreview>,
}

#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Rows inside the viewport, starting at display row `first_row`
    pub rows: Vec<RowView>,
    pub first_row: usize,
    pub cursor: usize,
    /// Threads in the store
    pub total: usize,
    /// Rows after filtering
    pub display_count: usize,
    /// Metadata fetches in flight
    pub hydrating: usize,
    pub inbox: InboxStatus,
    pub selected: usize,
    /// "Archived 3 threads" while an undo is available
    pub undo: Option<String>,
    pub prompt: Option<String>,
    pub search: SearchView,
    pub message: String,
    pub error: Option<String>,
    pub has_unacknowledged_error: bool,
    pub reader: Option<ReaderView>,
    pub help: bool,
}

impl Snapshot {
    pub fn capture(state: &AppState) -> Self {
        let now = Local::now();
        let end = (state.scroll_offset + state.viewport_rows).min(state.display_count());
        let rows = (state.scroll_offset..end)
            .filter_map(|row| {
                let idx = state.thread_index_at(row)?;
                let record = state.store.get(idx)?;
                Some(row_view(
                    record,
                    row == state.cursor,
                    state.selection.contains(&record.key),
                    &now,
                ))
            })
            .collect();

        let editing = match &state.mode {
            Mode::Search { input, .. } => Some(input.clone()),
            _ => None,
        };

        let reader = (state.mode == Mode::Reader).then(|| ReaderView {
            subject: state
                .reader
                .key
                .as_ref()
                .and_then(|k| state.store.iter().find(|t| &t.key == k))
                .map(|t| t.subject.clone())
                .unwrap_or_default(),
            messages: state.reader.messages.clone(),
            expanded: state
                .reader
                .messages
                .iter()
                .map(|m| state.reader.is_expanded(m))
                .collect(),
            selected: state.reader.selected,
            loading: state.reader.loading,
            scroll: state.reader.scroll,
            attachments: state.reader.attachments.clone(),
            preview: state.reader.preview.clone(),
        });

        Self {
            rows,
            first_row: state.scroll_offset,
            cursor: state.cursor,
            total: state.store.len(),
            display_count: state.display_count(),
            hydrating: state.loader.count(),
            inbox: state.inbox,
            selected: state.selection.len(),
            undo: state
                .undo
                .as_ref()
                .map(|u| format!("{} {}", u.action.past_tense(), thread_count(u.len()))),
            prompt: state
                .pending
                .as_ref()
                .map(|p| p.action.prompt(p.refs.len())),
            search: SearchView {
                query: state.search.query.clone(),
                editing,
                remote_loading: state.search.remote_loading,
            },
            message: state.status.message.clone(),
            error: state.status.error.clone(),
            has_unacknowledged_error: state.status.has_unacknowledged_error,
            reader,
            help: state.show_help,
        }
    }
}

fn row_view(
    record: &ThreadRecord,
    focused: bool,
    selected: bool,
    now: &chrono::DateTime<Local>,
) -> RowView {
    let time = record
        .local_time()
        .map(|dt| {
            if dt.date_naive() == now.date_naive() {
                dt.format("%H:%M").to_string()
            } else if dt.year() == now.year() {
                dt.format("%b %d").to_string()
            } else {
                dt.format("%Y-%m-%d").to_string()
            }
        })
        .unwrap_or_default();

    RowView {
        key: record.key.clone(),
        account_name: record.account_name.clone(),
        sender: display_sender(&record.sender),
        subject: record.subject.clone(),
        snippet: record.snippet.clone(),
        time,
        unread: record.unread,
        selected,
        loaded: record.loaded,
        search_only: record.search_only,
        has_attachment: record.has_attachment,
        message_count: record.message_count,
        focused,
    }
}

/// "Alice <alice@example.com>" -> "Alice"
fn display_sender(from: &str) -> String {
    match from.find('<') {
        Some(0) => from
            .trim_matches(|c| c == '<' || c == '>')
            .to_string(),
        Some(pos) => from[..pos].trim().trim_matches('"').to_string(),
        None => from.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::store::tests::{loaded, stub};

    #[test]
    fn test_display_sender() {
        assert_eq!(display_sender("Alice <alice@example.com>"), "Alice");
        assert_eq!(display_sender("\"Bob B\" <bob@example.com>"), "Bob B");
        assert_eq!(display_sender("<carol@example.com>"), "carol@example.com");
        assert_eq!(display_sender("dave@example.com"), "dave@example.com");
    }

    #[test]
    fn test_snapshot_window_and_focus() {
        let mut state = AppState::new(vec!["Personal".to_string()], 0);
        state.store.replace_threads(vec![
            loaded("a", 4),
            loaded("b", 3),
            stub("c"),
            loaded("d", 1),
        ]);
        state.set_viewport(2);
        state.cursor = 2;
        state.clamp_cursor();

        let snap = state.snapshot();
        assert_eq!(snap.first_row, 1);
        assert_eq!(snap.rows.len(), 2);
        assert_eq!(snap.rows[0].key, ThreadKey::new(0, "b"));
        let focused = snap.rows.iter().find(|r| r.focused).unwrap();
        assert_eq!(focused.key, ThreadKey::new(0, "c"));
        assert!(!focused.loaded);
        assert!(focused.time.is_empty());
        assert_eq!(snap.total, 4);
    }

    #[test]
    fn test_snapshot_prompt_and_undo() {
        let mut state = AppState::new(vec!["Personal".to_string()], 0);
        state.store.replace_threads(vec![loaded("a", 2), loaded("b", 1)]);
        state.stage(crate::app::undo::DestructiveAction::Archive);
        assert_eq!(
            state.snapshot().prompt.as_deref(),
            Some("Archive 1 thread? (y/n)")
        );

        state.confirm_pending();
        state.apply(crate::app::event::AppEvent::ThreadsActioned {
            action: crate::app::undo::DestructiveAction::Archive,
            refs: vec![ThreadKey::new(0, "a")],
            failed: Vec::new(),
        });
        let snap = state.snapshot();
        assert!(snap.prompt.is_none());
        assert_eq!(snap.undo.as_deref(), Some("Archived 1 thread"));
    }
}
