use std::collections::HashSet;

use crate::mail::{ThreadKey, ThreadRecord};

/// Canonical thread collection across all accounts.
///
/// Hydrated records are kept newest first; unhydrated records trail until
/// their metadata arrives. Keys are unique.
#[derive(Debug, Clone, Default)]
pub struct ThreadStore {
    threads: Vec<ThreadRecord>,
    /// Continuation token for the next listing page (first account only)
    pub next_page_token: Option<String>,
}

impl ThreadStore {
    pub fn len(&self) -> usize {
        self.threads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ThreadRecord> {
        self.threads.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ThreadRecord> {
        self.threads.iter()
    }

    pub fn position(&self, key: &ThreadKey) -> Option<usize> {
        self.threads.iter().position(|t| &t.key == key)
    }

    pub fn contains(&self, key: &ThreadKey) -> bool {
        self.position(key).is_some()
    }

    pub fn find_mut(&mut self, key: &ThreadKey) -> Option<&mut ThreadRecord> {
        self.threads.iter_mut().find(|t| &t.key == key)
    }

    pub fn all_loaded(&self) -> bool {
        self.threads.iter().all(|t| t.loaded)
    }

    pub fn unloaded_keys(&self) -> Vec<ThreadKey> {
        self.threads
            .iter()
            .filter(|t| !t.loaded)
            .map(|t| t.key.clone())
            .collect()
    }

    /// Hand the records to a reconcile pass
    pub fn take_threads(&mut self) -> Vec<ThreadRecord> {
        std::mem::take(&mut self.threads)
    }

    pub fn replace_threads(&mut self, threads: Vec<ThreadRecord>) {
        self.threads = threads;
    }

    /// Append records whose keys are not already present. Returns the keys
    /// that were actually inserted.
    pub fn append_new(&mut self, records: impl IntoIterator<Item = ThreadRecord>) -> Vec<ThreadKey> {
        let mut seen: HashSet<ThreadKey> = self.threads.iter().map(|t| t.key.clone()).collect();
        let mut added = Vec::new();
        for record in records {
            if seen.insert(record.key.clone()) {
                added.push(record.key.clone());
                self.threads.push(record);
            }
        }
        added
    }

    /// Remove records by key, returning exact snapshots in store order
    pub fn remove(&mut self, keys: &HashSet<ThreadKey>) -> Vec<ThreadRecord> {
        if keys.is_empty() {
            return Vec::new();
        }
        let (removed, kept): (Vec<ThreadRecord>, Vec<ThreadRecord>) = self
            .take_threads()
            .into_iter()
            .partition(|t| keys.contains(&t.key));
        self.threads = kept;
        removed
    }

    /// Drop every record that only exists as a remote search result.
    /// Returns true if anything was removed.
    pub fn prune_search_only(&mut self) -> bool {
        let before = self.threads.len();
        self.threads.retain(|t| !t.search_only);
        self.threads.len() != before
    }

    /// Stable sort: hydrated newest first, then unhydrated in insertion order
    pub fn sort_by_date(&mut self) {
        self.threads.sort_by(|a, b| {
            b.loaded
                .cmp(&a.loaded)
                .then_with(|| match (a.loaded, b.loaded) {
                    (true, true) => b.timestamp.cmp(&a.timestamp),
                    _ => std::cmp::Ordering::Equal,
                })
        });
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::mail::ThreadMetadata;

    pub(crate) fn loaded(id: &str, timestamp: i64) -> ThreadRecord {
        let mut record = ThreadRecord::stub(ThreadKey::new(0, id), "Personal");
        record.hydrate(ThreadMetadata {
            subject: format!("Subject {}", id),
            timestamp,
            ..Default::default()
        });
        record
    }

    pub(crate) fn stub(id: &str) -> ThreadRecord {
        ThreadRecord::stub(ThreadKey::new(0, id), "Personal")
    }

    fn ids(store: &ThreadStore) -> Vec<&str> {
        store.iter().map(|t| t.key.thread_id.as_str()).collect()
    }

    #[test]
    fn test_sort_newest_first_unloaded_last() {
        let mut store = ThreadStore::default();
        store.replace_threads(vec![
            stub("s1"),
            loaded("old", 100),
            loaded("new", 300),
            stub("s2"),
            loaded("mid", 200),
        ]);
        store.sort_by_date();
        assert_eq!(ids(&store), vec!["new", "mid", "old", "s1", "s2"]);
    }

    #[test]
    fn test_sort_is_stable_for_equal_timestamps() {
        let mut store = ThreadStore::default();
        store.replace_threads(vec![loaded("a", 100), loaded("b", 100), loaded("c", 100)]);
        store.sort_by_date();
        assert_eq!(ids(&store), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_append_new_skips_existing_keys() {
        let mut store = ThreadStore::default();
        store.replace_threads(vec![loaded("a", 1)]);
        let added = store.append_new(vec![stub("a"), stub("b"), stub("b")]);
        assert_eq!(added, vec![ThreadKey::new(0, "b")]);
        assert_eq!(ids(&store), vec!["a", "b"]);
        assert!(store.get(0).unwrap().loaded);
    }

    #[test]
    fn test_remove_returns_snapshots_in_store_order() {
        let mut store = ThreadStore::default();
        store.replace_threads(vec![loaded("a", 3), loaded("b", 2), loaded("c", 1)]);
        let keys: HashSet<_> = [ThreadKey::new(0, "c"), ThreadKey::new(0, "a")].into();
        let removed = store.remove(&keys);
        assert_eq!(removed.len(), 2);
        assert_eq!(removed[0].key.thread_id, "a");
        assert_eq!(removed[1].key.thread_id, "c");
        assert_eq!(ids(&store), vec!["b"]);
    }

    #[test]
    fn test_prune_search_only() {
        let mut store = ThreadStore::default();
        let mut found = stub("found");
        found.search_only = true;
        store.replace_threads(vec![loaded("a", 1), found]);
        assert!(store.prune_search_only());
        assert!(!store.prune_search_only());
        assert_eq!(ids(&store), vec!["a"]);
    }
}
