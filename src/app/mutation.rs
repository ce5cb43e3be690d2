//! Optimistic read/unread toggles, staged bulk actions, and undo

use std::collections::HashSet;

use crate::mail::{GatewayError, ThreadKey};

use super::event::Effect;
use super::state::AppState;
use super::undo::{DestructiveAction, PendingDestructive, UndoBuffer, thread_count};

fn first_error(failed: &[(ThreadKey, GatewayError)]) -> String {
    failed
        .first()
        .map(|(_, e)| e.to_string())
        .unwrap_or_default()
}

impl AppState {
    /// Flip the unread flag now and ask the server to follow
    pub(crate) fn set_unread(&mut self, key: &ThreadKey, unread: bool) -> Vec<Effect> {
        let Some(record) = self.store.find_mut(key) else {
            return Vec::new();
        };
        if record.unread == unread {
            return Vec::new();
        }
        record.unread = unread;
        vec![Effect::SetUnread {
            key: key.clone(),
            unread,
        }]
    }

    pub(crate) fn toggle_unread(&mut self, key: &ThreadKey) -> Vec<Effect> {
        let current = self.store.iter().find(|t| &t.key == key).map(|t| t.unread);
        match current {
            Some(unread) => self.set_unread(key, !unread),
            None => Vec::new(),
        }
    }

    pub(crate) fn on_thread_marked(
        &mut self,
        key: ThreadKey,
        unread: bool,
        result: Result<(), GatewayError>,
    ) -> Vec<Effect> {
        if let Err(e) = result {
            tracing::warn!("Failed to set unread={} on {}: {}", unread, key, e);
            if let Some(record) = self.store.find_mut(&key) {
                record.unread = !unread;
            }
            self.status.set_error(format!("Failed to update thread: {}", e));
        }
        Vec::new()
    }

    /// Stage a bulk action on the selection (or focused row) for confirmation
    pub(crate) fn stage(&mut self, action: DestructiveAction) {
        if self.destructive_in_progress || self.undo_in_progress {
            self.status.set_message("Another action is still running");
            return;
        }
        let refs = self.selection.targets(&self.store, self.focused_key());
        if refs.is_empty() {
            return;
        }
        self.pending = Some(PendingDestructive { action, refs });
    }

    pub(crate) fn cancel_pending(&mut self) {
        if self.pending.take().is_some() {
            self.status.set_message("Cancelled");
        }
    }

    pub(crate) fn confirm_pending(&mut self) -> Vec<Effect> {
        let Some(pending) = self.pending.take() else {
            return Vec::new();
        };
        if self.destructive_in_progress || self.undo_in_progress {
            return Vec::new();
        }
        self.destructive_in_progress = true;
        self.status.set_message(format!(
            "Working on {}...",
            thread_count(pending.refs.len())
        ));
        vec![Effect::RunAction {
            action: pending.action,
            refs: pending.refs,
        }]
    }

    pub(crate) fn on_threads_actioned(
        &mut self,
        action: DestructiveAction,
        refs: Vec<ThreadKey>,
        failed: Vec<(ThreadKey, GatewayError)>,
    ) -> Vec<Effect> {
        self.destructive_in_progress = false;
        self.status.set_message("");
        if refs.is_empty() {
            return Vec::new();
        }

        let failed_keys: HashSet<&ThreadKey> = failed.iter().map(|(k, _)| k).collect();
        let succeeded: HashSet<ThreadKey> = refs
            .iter()
            .filter(|k| !failed_keys.contains(k))
            .cloned()
            .collect();

        let focus = self.focused_key();
        let removed = self.store.remove(&succeeded);
        if !removed.is_empty() {
            self.after_store_change(focus);
        }
        tracing::info!(
            "{} {} of {} threads ({} failed)",
            action.past_tense(),
            removed.len(),
            refs.len(),
            failed.len()
        );

        if !failed.is_empty() {
            self.status.set_error(format!(
                "Failed to {} {}: {}",
                action.verb(),
                thread_count(failed.len()),
                first_error(&failed)
            ));
        }

        let count = removed.len();
        self.undo = UndoBuffer::new(action, removed);
        if failed.is_empty() && self.undo.is_some() {
            self.status.set_message(format!(
                "{} {} (u to undo)",
                action.past_tense(),
                thread_count(count)
            ));
        }
        Vec::new()
    }

    pub(crate) fn request_undo(&mut self) -> Vec<Effect> {
        if self.undo_in_progress || self.destructive_in_progress {
            return Vec::new();
        }
        let Some(buffer) = &self.undo else {
            self.status.set_message("Nothing to undo");
            return Vec::new();
        };
        self.undo_in_progress = true;
        vec![Effect::RunUndo {
            action: buffer.action,
            refs: buffer.refs(),
        }]
    }

    pub(crate) fn on_threads_undone(
        &mut self,
        action: DestructiveAction,
        refs: Vec<ThreadKey>,
        failed: Vec<(ThreadKey, GatewayError)>,
    ) -> Vec<Effect> {
        self.undo_in_progress = false;
        if refs.is_empty() {
            return Vec::new();
        }
        let Some(buffer) = self.undo.take() else {
            return Vec::new();
        };

        let attempted: HashSet<&ThreadKey> = refs.iter().collect();
        let failed_keys: HashSet<&ThreadKey> = failed.iter().map(|(k, _)| k).collect();
        let (restore, remaining): (Vec<_>, Vec<_>) = buffer
            .records
            .into_iter()
            .partition(|t| attempted.contains(&t.key) && !failed_keys.contains(&t.key));

        let focus = self.focused_key();
        let restored = self.store.append_new(restore);
        if !restored.is_empty() {
            self.store.sort_by_date();
            self.after_store_change(focus);
        }
        tracing::info!(
            "Undo {:?}: restored {}, {} still buffered",
            action,
            restored.len(),
            remaining.len()
        );

        self.undo = UndoBuffer::new(buffer.action, remaining);

        if failed.is_empty() {
            self.status
                .set_message(format!("Restored {}", thread_count(restored.len())));
        } else {
            self.status.set_error(format!(
                "Failed to undo {}: {}",
                thread_count(failed.len()),
                first_error(&failed)
            ));
        }
        Vec::new()
    }
}
