//! Application state types
//!
//! `AppState` is owned by the event loop and mutated only there. Async
//! results come in through [`AppState::apply`]; key presses through
//! [`AppState::handle_action`]. Both return the follow-up work to spawn.

use crate::constants::{DEFAULT_VIEWPORT_ROWS, ERROR_TTL_SECS, LOAD_MORE_THRESHOLD};
use crate::input::Action;
use crate::mail::{ThreadKey, ThreadRecord};

use super::event::{AppEvent, Effect, LoadSource};
use super::loader::LoadCursor;
use super::reader::ReaderState;
use super::search::SearchSession;
use super::selection::Selection;
use super::snapshot::Snapshot;
use super::store::ThreadStore;
use super::undo::{DestructiveAction, PendingDestructive, UndoBuffer};

/// Which part of the screen receives keys
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Inbox,
    /// Search prompt open; `previous` is restored on cancel
    Search { input: String, previous: String },
    Reader,
}

/// Listing requests in flight
#[derive(Debug, Clone, Copy, Default)]
pub struct InboxStatus {
    pub loading: bool,
    pub refreshing: bool,
    pub loading_more: bool,
}

impl InboxStatus {
    pub fn busy(&self) -> bool {
        self.loading || self.refreshing || self.loading_more
    }
}

/// Loading, error, and status message state
#[derive(Debug, Clone, Default)]
pub struct StatusState {
    pub error: Option<String>,
    pub error_time: Option<std::time::Instant>,
    pub message: String,
    /// Persists after error bar expires - shown as indicator in status bar
    pub has_unacknowledged_error: bool,
}

impl StatusState {
    pub fn set_error(&mut self, error: impl ToString) {
        self.error = Some(error.to_string());
        self.error_time = Some(std::time::Instant::now());
        self.has_unacknowledged_error = true;
    }

    pub fn clear_error(&mut self) {
        self.error = None;
        self.error_time = None;
    }

    /// Called on user input: errors are transient
    pub fn dismiss(&mut self) {
        self.clear_error();
        self.has_unacknowledged_error = false;
    }

    /// Clear error if TTL expired. Returns true if error was cleared.
    pub fn clear_error_if_expired(&mut self) -> bool {
        if let Some(time) = self.error_time
            && time.elapsed().as_secs() >= ERROR_TTL_SECS
        {
            self.clear_error();
            true
        } else {
            false
        }
    }

    pub fn set_message(&mut self, msg: impl ToString) {
        self.message = msg.to_string();
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub store: ThreadStore,
    pub selection: Selection,
    pub search: SearchSession,
    pub loader: LoadCursor,
    pub undo: Option<UndoBuffer>,
    pub undo_in_progress: bool,
    pub pending: Option<PendingDestructive>,
    pub destructive_in_progress: bool,
    pub inbox: InboxStatus,

    /// Store indices shown while a query is active
    pub filtered: Option<Vec<usize>>,
    /// Display row of the focused thread
    pub cursor: usize,
    pub scroll_offset: usize,
    pub viewport_rows: usize,

    pub mode: Mode,
    pub reader: ReaderState,
    pub status: StatusState,
    /// Key help overlay; the next key closes it
    pub show_help: bool,

    /// Account display names by index
    pub account_names: Vec<String>,
    /// 0 disables background refresh
    pub refresh_interval_secs: u64,
}

impl AppState {
    pub fn new(account_names: Vec<String>, refresh_interval_secs: u64) -> Self {
        Self {
            store: ThreadStore::default(),
            selection: Selection::default(),
            search: SearchSession::default(),
            loader: LoadCursor::default(),
            undo: None,
            undo_in_progress: false,
            pending: None,
            destructive_in_progress: false,
            inbox: InboxStatus::default(),
            filtered: None,
            cursor: 0,
            scroll_offset: 0,
            viewport_rows: DEFAULT_VIEWPORT_ROWS,
            mode: Mode::Inbox,
            reader: ReaderState::default(),
            status: StatusState::default(),
            show_help: false,
            account_names,
            refresh_interval_secs,
        }
    }

    /// Kick off the first listing and the refresh timer
    pub fn start(&mut self) -> Vec<Effect> {
        self.inbox.loading = true;
        self.status.set_message("Loading inbox...");
        let mut effects = vec![Effect::LoadInbox(LoadSource::Initial)];
        if self.refresh_interval_secs > 0 {
            effects.push(Effect::ScheduleAutoRefresh);
        }
        effects
    }

    /// Apply one async result
    pub fn apply(&mut self, event: AppEvent) -> Vec<Effect> {
        match event {
            AppEvent::InboxLoaded { source, result } => {
                let effects = self.on_inbox_loaded(source, result);
                if self.status.message.starts_with("Loading") || self.status.message.starts_with("Refreshing") {
                    self.status.set_message("");
                }
                effects
            }
            AppEvent::MetadataLoaded { key, result } => self.on_metadata_loaded(key, result),
            AppEvent::MetadataBatchLoaded { results } => self.on_metadata_batch_loaded(results),
            AppEvent::SearchDebounced { query, generation } => {
                self.on_search_debounced(query, generation)
            }
            AppEvent::SearchLoaded {
                query,
                generation,
                result,
            } => self.on_search_loaded(query, generation, result),
            AppEvent::ThreadMarked {
                key,
                unread,
                result,
            } => self.on_thread_marked(key, unread, result),
            AppEvent::ThreadsActioned {
                action,
                refs,
                failed,
            } => self.on_threads_actioned(action, refs, failed),
            AppEvent::ThreadsUndone {
                action,
                refs,
                failed,
            } => self.on_threads_undone(action, refs, failed),
            AppEvent::ThreadLoaded { key, result } => self.on_thread_loaded(key, result),
            AppEvent::AttachmentSaved { filename, result } => {
                self.on_attachment_saved(filename, result)
            }
            AppEvent::AttachmentLoaded {
                message_id,
                attachment,
                result,
            } => self.on_attachment_loaded(message_id, attachment, result),
            AppEvent::AutoRefresh => self.on_auto_refresh(),
        }
    }

    /// Apply one async result and return what the view should draw next
    pub fn update(&mut self, event: AppEvent) -> (Snapshot, Vec<Effect>) {
        let effects = self.apply(event);
        (self.snapshot(), effects)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(self)
    }

    // View over the store

    pub fn display_count(&self) -> usize {
        match &self.filtered {
            Some(indices) => indices.len(),
            None => self.store.len(),
        }
    }

    /// Store index shown at a display row
    pub fn thread_index_at(&self, row: usize) -> Option<usize> {
        let idx = match &self.filtered {
            Some(indices) => *indices.get(row)?,
            None => row,
        };
        (idx < self.store.len()).then_some(idx)
    }

    pub fn focused_index(&self) -> Option<usize> {
        self.thread_index_at(self.cursor)
    }

    pub fn focused_record(&self) -> Option<&ThreadRecord> {
        self.focused_index().and_then(|i| self.store.get(i))
    }

    pub fn focused_key(&self) -> Option<ThreadKey> {
        self.focused_record().map(|t| t.key.clone())
    }

    fn display_position(&self, key: &ThreadKey) -> Option<usize> {
        match &self.filtered {
            Some(indices) => indices
                .iter()
                .position(|&i| self.store.get(i).is_some_and(|t| &t.key == key)),
            None => self.store.position(key),
        }
    }

    /// Store indices of rows inside the viewport
    pub fn visible_indices(&self) -> Vec<usize> {
        let end = (self.scroll_offset + self.viewport_rows).min(self.display_count());
        (self.scroll_offset..end)
            .filter_map(|row| self.thread_index_at(row))
            .collect()
    }

    pub fn clamp_cursor(&mut self) {
        let count = self.display_count();
        if count == 0 {
            self.cursor = 0;
        } else if self.cursor >= count {
            self.cursor = count - 1;
        }
        self.ensure_cursor_visible();
    }

    fn ensure_cursor_visible(&mut self) {
        let rows = self.viewport_rows;
        let count = self.display_count();
        if rows == 0 || count <= rows {
            self.scroll_offset = 0;
            return;
        }
        let max_offset = count - rows;
        if self.cursor < self.scroll_offset {
            self.scroll_offset = self.cursor;
        } else if self.cursor >= self.scroll_offset + rows {
            self.scroll_offset = self.cursor + 1 - rows;
        }
        self.scroll_offset = self.scroll_offset.min(max_offset);
    }

    /// Put the cursor back on `focus` if it is still shown, else clamp
    pub(crate) fn restore_focus(&mut self, focus: Option<ThreadKey>) {
        if let Some(row) = focus.as_ref().and_then(|k| self.display_position(k)) {
            self.cursor = row;
        }
        self.clamp_cursor();
    }

    /// Re-derive everything that depends on store contents or order
    pub(crate) fn after_store_change(&mut self, focus: Option<ThreadKey>) {
        self.selection.prune(&self.store);
        self.filtered = self.compute_filter();
        self.restore_focus(focus);
    }

    pub fn set_viewport(&mut self, rows: usize) {
        self.viewport_rows = rows.max(1);
        self.ensure_cursor_visible();
    }

    pub fn on_resize(&mut self, rows: usize) -> Vec<Effect> {
        self.set_viewport(rows);
        self.request_window()
    }

    // Navigation

    fn move_cursor(&mut self, delta: isize) -> Vec<Effect> {
        let count = self.display_count();
        if count == 0 {
            return Vec::new();
        }
        let target = self.cursor.saturating_add_signed(delta).min(count - 1);
        self.jump_to(target)
    }

    fn jump_to(&mut self, row: usize) -> Vec<Effect> {
        self.cursor = row;
        self.clamp_cursor();
        let mut effects = self.request_window();
        effects.extend(self.maybe_load_more());
        effects
    }

    /// Request the next page when the cursor nears the end of the list
    fn maybe_load_more(&mut self) -> Vec<Effect> {
        if self.search.is_active() || self.inbox.busy() {
            return Vec::new();
        }
        let Some(token) = self.store.next_page_token.clone() else {
            return Vec::new();
        };
        if self.cursor + LOAD_MORE_THRESHOLD < self.display_count() {
            return Vec::new();
        }
        self.inbox.loading_more = true;
        vec![Effect::LoadMore { token }]
    }

    fn refresh(&mut self) -> Vec<Effect> {
        if self.inbox.busy() {
            self.status.set_message("Refresh already in progress");
            return Vec::new();
        }
        self.inbox.refreshing = true;
        self.status.set_message("Refreshing...");
        vec![Effect::LoadInbox(LoadSource::Manual)]
    }

    fn on_auto_refresh(&mut self) -> Vec<Effect> {
        if self.refresh_interval_secs == 0 {
            return Vec::new();
        }
        if self.inbox.busy() {
            tracing::debug!("Skipping background refresh, a load is in flight");
            return vec![Effect::ScheduleAutoRefresh];
        }
        self.inbox.refreshing = true;
        vec![
            Effect::LoadInbox(LoadSource::Auto),
            Effect::ScheduleAutoRefresh,
        ]
    }

    // Input

    pub fn handle_action(&mut self, action: Action) -> Vec<Effect> {
        if self.show_help {
            self.show_help = false;
            return Vec::new();
        }
        if self.pending.is_some() {
            return match action {
                Action::Confirm => self.confirm_pending(),
                Action::Cancel | Action::Back => {
                    self.cancel_pending();
                    Vec::new()
                }
                _ => Vec::new(),
            };
        }

        match self.mode {
            Mode::Search { .. } => {
                return match action {
                    Action::Confirm => self.submit_search(),
                    Action::Cancel | Action::Back => self.cancel_search(),
                    _ => Vec::new(),
                };
            }
            Mode::Reader => return self.handle_reader_action(action),
            Mode::Inbox => {}
        }

        let page = self.viewport_rows.max(1) as isize;
        match action {
            Action::Up => self.move_cursor(-1),
            Action::Down => self.move_cursor(1),
            Action::PageUp => self.move_cursor(-page),
            Action::PageDown => self.move_cursor(page),
            Action::Top => self.jump_to(0),
            Action::Bottom => self.jump_to(self.display_count().saturating_sub(1)),
            Action::Open => self.open_focused(),
            Action::ToggleRead => match self.focused_key() {
                Some(key) => self.toggle_unread(&key),
                None => Vec::new(),
            },
            Action::ToggleSelect => {
                if let Some(key) = self.focused_key() {
                    self.selection.toggle(key);
                }
                Vec::new()
            }
            Action::ClearSelection => {
                self.selection.clear();
                Vec::new()
            }
            Action::Archive => {
                self.stage(DestructiveAction::Archive);
                Vec::new()
            }
            Action::Trash => {
                self.stage(DestructiveAction::Trash);
                Vec::new()
            }
            Action::DeletePermanently => {
                self.stage(DestructiveAction::DeletePermanently);
                Vec::new()
            }
            Action::Undo => self.request_undo(),
            Action::Refresh => self.refresh(),
            Action::Search => {
                self.open_search();
                Vec::new()
            }
            Action::Help => {
                self.show_help = true;
                Vec::new()
            }
            Action::Back | Action::Cancel => {
                if !self.selection.is_empty() {
                    self.selection.clear();
                    Vec::new()
                } else if self.search.is_active() {
                    self.edit_query("")
                } else {
                    Vec::new()
                }
            }
            Action::Confirm
            | Action::Quit
            | Action::ToggleExpand
            | Action::Attachments
            | Action::Download
            | Action::Preview => Vec::new(),
        }
    }

    /// Typed character, only meaningful in the search prompt
    pub fn handle_char(&mut self, c: char) -> Vec<Effect> {
        self.search_input_changed(|input| input.push(c))
    }

    pub fn handle_backspace(&mut self) -> Vec<Effect> {
        self.search_input_changed(|input| {
            input.pop();
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::event::Listing;
    use crate::app::store::tests::{loaded, stub};
    use crate::mail::{GatewayError, Message};
    use crate::mail::mock::test_metadata;

    fn key(id: &str) -> ThreadKey {
        ThreadKey::new(0, id)
    }

    fn listing(ids: &[&str], token: Option<&str>) -> Listing {
        Listing {
            keys: ids.iter().map(|id| key(id)).collect(),
            next_page_token: token.map(str::to_string),
        }
    }

    fn state(refresh: u64) -> AppState {
        AppState::new(vec!["Personal".to_string()], refresh)
    }

    #[test]
    fn test_start_loads_and_arms_timer() {
        let mut state = state(60);
        let effects = state.start();
        assert_eq!(
            effects,
            vec![
                Effect::LoadInbox(LoadSource::Initial),
                Effect::ScheduleAutoRefresh
            ]
        );
        assert!(state.inbox.loading);

        let mut quiet = AppState::new(Vec::new(), 0);
        assert_eq!(quiet.start(), vec![Effect::LoadInbox(LoadSource::Initial)]);
    }

    #[test]
    fn test_initial_load_requests_backlog() {
        let mut state = state(0);
        state.start();
        let effects = state.apply(AppEvent::InboxLoaded {
            source: LoadSource::Initial,
            result: Ok(listing(&["a", "b"], Some("next"))),
        });

        assert!(!state.inbox.loading);
        assert_eq!(state.store.len(), 2);
        assert_eq!(state.store.next_page_token.as_deref(), Some("next"));
        assert_eq!(effects, vec![Effect::HydrateBacklog(vec![key("a"), key("b")])]);
        assert_eq!(state.loader.count(), 2);
    }

    #[test]
    fn test_failed_listing_leaves_store_untouched() {
        let mut state = state(0);
        state.store.replace_threads(vec![loaded("a", 1)]);
        state.inbox.refreshing = true;

        let effects = state.apply(AppEvent::InboxLoaded {
            source: LoadSource::Manual,
            result: Err(GatewayError::Auth("expired".into())),
        });

        assert!(effects.is_empty());
        assert!(!state.inbox.refreshing);
        assert_eq!(state.store.len(), 1);
        assert!(state.status.error.as_deref().unwrap().contains("authentication failed"));
    }

    #[test]
    fn test_background_refresh_notifies_only_when_new() {
        let mut state = state(60);
        state.store.replace_threads(vec![loaded("a", 1)]);

        let effects = state.apply(AppEvent::InboxLoaded {
            source: LoadSource::Auto,
            result: Ok(listing(&["new", "a"], None)),
        });
        assert_eq!(effects[0], Effect::Notify { count: 1 });

        let effects = state.apply(AppEvent::InboxLoaded {
            source: LoadSource::Manual,
            result: Ok(listing(&["newer", "new", "a"], None)),
        });
        assert!(!effects.iter().any(|e| matches!(e, Effect::Notify { .. })));

        let effects = state.apply(AppEvent::InboxLoaded {
            source: LoadSource::Auto,
            result: Ok(listing(&["a"], None)),
        });
        assert!(!effects.iter().any(|e| matches!(e, Effect::Notify { .. })));
    }

    #[test]
    fn test_update_returns_snapshot_with_effects() {
        let mut state = state(0);
        state.start();

        let (snap, effects) = state.update(AppEvent::InboxLoaded {
            source: LoadSource::Initial,
            result: Ok(listing(&["a", "b"], Some("next"))),
        });

        assert_eq!(snap.total, 2);
        assert_eq!(snap.display_count, 2);
        assert!(!snap.inbox.busy());
        assert!(snap.message.is_empty());
        assert_eq!(snap.rows.len(), 2);
        assert!(snap.rows.iter().all(|r| !r.loaded));
        assert_eq!(
            effects,
            vec![Effect::HydrateBacklog(vec![key("a"), key("b")])]
        );
        assert_eq!(snap.hydrating, 2);
    }

    #[test]
    fn test_background_load_into_empty_store_does_not_notify() {
        // First listing failed, so the timer delivers the whole inbox
        let mut state = state(60);
        let ids: Vec<String> = (0..50).map(|i| format!("t{}", i)).collect();
        let refs: Vec<&str> = ids.iter().map(String::as_str).collect();

        let effects = state.apply(AppEvent::InboxLoaded {
            source: LoadSource::Auto,
            result: Ok(listing(&refs, None)),
        });

        assert_eq!(state.store.len(), 50);
        assert!(!effects.iter().any(|e| matches!(e, Effect::Notify { .. })));
    }

    #[test]
    fn test_refresh_sorts_only_when_all_loaded() {
        let mut state = state(0);
        state.store.replace_threads(vec![loaded("old", 1), loaded("new", 2)]);
        state.apply(AppEvent::InboxLoaded {
            source: LoadSource::Manual,
            result: Ok(listing(&["old", "new"], None)),
        });
        let order: Vec<_> = state.store.iter().map(|t| t.key.thread_id.clone()).collect();
        assert_eq!(order, vec!["new", "old"]);

        state.apply(AppEvent::InboxLoaded {
            source: LoadSource::Manual,
            result: Ok(listing(&["old", "fresh", "new"], None)),
        });
        let order: Vec<_> = state.store.iter().map(|t| t.key.thread_id.clone()).collect();
        assert_eq!(order, vec!["old", "fresh", "new"]);
    }

    #[test]
    fn test_auto_refresh_skipped_while_busy() {
        let mut state = state(30);
        state.inbox.loading_more = true;
        assert_eq!(
            state.apply(AppEvent::AutoRefresh),
            vec![Effect::ScheduleAutoRefresh]
        );

        state.inbox.loading_more = false;
        assert_eq!(
            state.apply(AppEvent::AutoRefresh),
            vec![
                Effect::LoadInbox(LoadSource::Auto),
                Effect::ScheduleAutoRefresh
            ]
        );
        assert!(state.inbox.refreshing);

        assert!(AppState::new(Vec::new(), 0).apply(AppEvent::AutoRefresh).is_empty());
    }

    #[test]
    fn test_moving_near_end_loads_more_once() {
        let mut state = state(0);
        let records = (0..8).map(|i| loaded(&format!("t{}", i), 100 - i)).collect();
        state.store.replace_threads(records);
        state.store.next_page_token = Some("p2".to_string());

        let effects = state.handle_action(Action::Down);
        assert!(effects.contains(&Effect::LoadMore {
            token: "p2".to_string()
        }));
        assert!(state.inbox.loading_more);

        let effects = state.handle_action(Action::Down);
        assert!(!effects.iter().any(|e| matches!(e, Effect::LoadMore { .. })));
    }

    #[test]
    fn test_page_append_hydrates_window() {
        let mut state = state(0);
        state.store.replace_threads(vec![loaded("a", 2)]);
        state.inbox.loading_more = true;

        let effects = state.apply(AppEvent::InboxLoaded {
            source: LoadSource::Page,
            result: Ok(listing(&["a", "b"], None)),
        });

        assert!(!state.inbox.loading_more);
        assert_eq!(state.store.len(), 2);
        assert_eq!(effects, vec![Effect::HydrateWindow(vec![key("b")])]);
        assert!(state.store.next_page_token.is_none());
    }

    #[test]
    fn test_open_marks_read_and_fetches() {
        let mut state = state(0);
        let mut unread = loaded("a", 1);
        unread.unread = true;
        state.store.replace_threads(vec![unread]);

        let effects = state.handle_action(Action::Open);
        assert_eq!(
            effects,
            vec![
                Effect::FetchThread(key("a")),
                Effect::SetUnread {
                    key: key("a"),
                    unread: false
                }
            ]
        );
        assert_eq!(state.mode, Mode::Reader);
        assert!(!state.store.get(0).unwrap().unread);

        let message = |id: &str| Message {
            id: id.to_string(),
            ..Default::default()
        };
        state.apply(AppEvent::ThreadLoaded {
            key: key("a"),
            result: Ok(vec![message("m1"), message("m2")]),
        });
        assert!(!state.reader.loading);
        assert_eq!(state.reader.messages[0].id, "m2");

        state.handle_action(Action::Back);
        assert_eq!(state.mode, Mode::Inbox);
    }

    #[test]
    fn test_confirmation_gates_actions() {
        let mut state = state(0);
        state.store.replace_threads(vec![loaded("a", 2), loaded("b", 1)]);

        state.handle_action(Action::Trash);
        assert!(state.pending.is_some());
        // Navigation is ignored while a prompt is up
        assert!(state.handle_action(Action::Down).is_empty());
        assert_eq!(state.cursor, 0);

        let effects = state.handle_action(Action::Confirm);
        assert_eq!(
            effects,
            vec![Effect::RunAction {
                action: DestructiveAction::Trash,
                refs: vec![key("a")]
            }]
        );
    }

    #[test]
    fn test_selection_pruned_after_removal() {
        let mut state = state(0);
        state.store.replace_threads(vec![loaded("a", 2), loaded("b", 1)]);
        state.handle_action(Action::ToggleSelect);
        assert_eq!(state.selection.len(), 1);

        state.handle_action(Action::Archive);
        state.handle_action(Action::Confirm);
        state.apply(AppEvent::ThreadsActioned {
            action: DestructiveAction::Archive,
            refs: vec![key("a")],
            failed: Vec::new(),
        });

        assert!(state.selection.is_empty());
        assert_eq!(state.store.len(), 1);
    }

    #[test]
    fn test_sort_keeps_focus_on_same_thread() {
        let mut state = state(0);
        state.store.replace_threads(vec![loaded("a", 10), stub("x")]);
        state.loader.claim([key("x")]);
        state.cursor = 0;

        state.apply(AppEvent::MetadataLoaded {
            key: key("x"),
            result: Ok(test_metadata("Newest", 99)),
        });

        assert_eq!(state.focused_key(), Some(key("a")));
        assert_eq!(state.cursor, 1);
    }

    #[test]
    fn test_no_duplicate_keys_under_mixed_events() {
        let mut state = state(0);
        state.apply(AppEvent::InboxLoaded {
            source: LoadSource::Initial,
            result: Ok(listing(&["a", "b"], Some("p"))),
        });
        state.apply(AppEvent::MetadataLoaded {
            key: key("a"),
            result: Ok(test_metadata("A", 5)),
        });
        state.apply(AppEvent::InboxLoaded {
            source: LoadSource::Page,
            result: Ok(listing(&["b", "c"], None)),
        });
        state.apply(AppEvent::InboxLoaded {
            source: LoadSource::Auto,
            result: Ok(listing(&["c", "d", "a"], None)),
        });
        state.apply(AppEvent::MetadataBatchLoaded {
            results: vec![(key("d"), Ok(test_metadata("D", 6)))],
        });

        let mut keys: Vec<_> = state.store.iter().map(|t| t.key.clone()).collect();
        let total = keys.len();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), total);
        assert_eq!(total, 4);
    }

    #[test]
    fn test_status_error_dismissal() {
        let mut status = StatusState::default();
        status.set_error("boom");
        assert!(status.has_unacknowledged_error);
        assert!(!status.clear_error_if_expired());
        status.dismiss();
        assert!(status.error.is_none());
        assert!(!status.has_unacknowledged_error);
    }

    #[test]
    fn test_help_overlay_swallows_next_key() {
        let mut state = state(0);
        state.store.replace_threads(vec![loaded("a", 2), loaded("b", 1)]);

        state.handle_action(Action::Help);
        assert!(state.show_help);
        assert!(state.snapshot().help);

        assert!(state.handle_action(Action::Down).is_empty());
        assert!(!state.show_help);
        assert_eq!(state.cursor, 0);
    }

    #[test]
    fn test_search_prompt_typing() {
        let mut state = state(0);
        state.store.replace_threads(vec![loaded("a", 2), loaded("b", 1)]);

        state.handle_action(Action::Search);
        let effects = state.handle_char('b');
        assert!(matches!(effects[..], [Effect::ArmSearchDebounce { .. }]));
        assert_eq!(state.search.query, "b");

        state.handle_backspace();
        assert!(!state.search.is_active());

        state.handle_char('a');
        state.handle_action(Action::Confirm);
        assert_eq!(state.mode, Mode::Inbox);
        assert_eq!(state.search.query, "a");
    }
}
