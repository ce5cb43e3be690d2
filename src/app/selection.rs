use std::collections::HashSet;

use crate::mail::ThreadKey;

use super::store::ThreadStore;

/// Threads marked for a bulk action
#[derive(Debug, Clone, Default)]
pub struct Selection {
    keys: HashSet<ThreadKey>,
}

impl Selection {
    pub fn toggle(&mut self, key: ThreadKey) {
        if !self.keys.remove(&key) {
            self.keys.insert(key);
        }
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    pub fn contains(&self, key: &ThreadKey) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Forget keys whose thread is no longer in the store
    pub fn prune(&mut self, store: &ThreadStore) {
        if self.keys.is_empty() {
            return;
        }
        let present: HashSet<&ThreadKey> = store.iter().map(|t| &t.key).collect();
        self.keys.retain(|k| present.contains(k));
    }

    /// Selected keys in store order
    pub fn refs(&self, store: &ThreadStore) -> Vec<ThreadKey> {
        store
            .iter()
            .filter(|t| self.keys.contains(&t.key))
            .map(|t| t.key.clone())
            .collect()
    }

    /// Bulk target: the selection, or the focused thread when nothing is selected
    pub fn targets(&self, store: &ThreadStore, focused: Option<ThreadKey>) -> Vec<ThreadKey> {
        if self.keys.is_empty() {
            focused.into_iter().collect()
        } else {
            self.refs(store)
        }
    }
}
