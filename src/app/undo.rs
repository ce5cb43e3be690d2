//! Destructive actions, the confirmation gate, and the undo buffer

use crate::mail::{ThreadKey, ThreadRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestructiveAction {
    Archive,
    Trash,
    DeletePermanently,
}

impl DestructiveAction {
    pub fn is_undoable(self) -> bool {
        !matches!(self, Self::DeletePermanently)
    }

    /// Verb for prompts and errors ("archive", "trash", "delete")
    pub fn verb(self) -> &'static str {
        match self {
            Self::Archive => "archive",
            Self::Trash => "trash",
            Self::DeletePermanently => "delete",
        }
    }

    /// Past tense for the undo toast
    pub fn past_tense(self) -> &'static str {
        match self {
            Self::Archive => "Archived",
            Self::Trash => "Trashed",
            Self::DeletePermanently => "Deleted",
        }
    }

    pub fn prompt(self, count: usize) -> String {
        let what = if count == 1 { "thread" } else { "threads" };
        match self {
            Self::DeletePermanently => {
                format!("Permanently delete {} {}? This cannot be undone (y/n)", count, what)
            }
            _ => {
                let verb = self.verb();
                let mut chars = verb.chars();
                let capitalized: String = chars
                    .next()
                    .map(|c| c.to_ascii_uppercase())
                    .into_iter()
                    .chain(chars)
                    .collect();
                format!("{} {} {}? (y/n)", capitalized, count, what)
            }
        }
    }
}

/// Staged targets awaiting confirmation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDestructive {
    pub action: DestructiveAction,
    pub refs: Vec<ThreadKey>,
}

/// Snapshots of the last archived or trashed threads
#[derive(Debug, Clone, PartialEq)]
pub struct UndoBuffer {
    pub action: DestructiveAction,
    pub records: Vec<ThreadRecord>,
}

impl UndoBuffer {
    /// Buffer removed records. Nothing is kept for permanent deletes or when
    /// nothing was removed.
    pub fn new(action: DestructiveAction, records: Vec<ThreadRecord>) -> Option<Self> {
        if !action.is_undoable() || records.is_empty() {
            return None;
        }
        Some(Self { action, records })
    }

    pub fn refs(&self) -> Vec<ThreadKey> {
        self.records.iter().map(|t| t.key.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

pub fn thread_count(count: usize) -> String {
    if count == 1 {
        "1 thread".to_string()
    } else {
        format!("{} threads", count)
    }
}
