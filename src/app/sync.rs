//! Reconciling fresh listings with the thread store

use std::collections::{HashMap, HashSet};

use crate::mail::{GatewayError, ThreadKey, ThreadRecord};

use super::event::{Effect, LoadSource, Listing};
use super::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileMode {
    /// Empty store: take the listing as is
    Initial,
    /// Next page: add after existing records
    Append,
    /// Manual or background refresh: merge, never delete
    Refresh,
}

impl ReconcileMode {
    pub fn for_load(source: LoadSource, store_empty: bool) -> Self {
        match source {
            LoadSource::Page => Self::Append,
            _ if store_empty => Self::Initial,
            _ => Self::Refresh,
        }
    }
}

fn account_name(names: &[String], index: usize) -> String {
    names.get(index).cloned().unwrap_or_default()
}

/// Merge `incoming` listing keys into `existing` records.
///
/// Returns the merged records and how many of them are new. Keys stay unique
/// in every mode, so a page that repeats an already listed thread adds
/// nothing.
pub fn reconcile(
    existing: Vec<ThreadRecord>,
    incoming: &[ThreadKey],
    mode: ReconcileMode,
    account_names: &[String],
) -> (Vec<ThreadRecord>, usize) {
    match mode {
        ReconcileMode::Initial | ReconcileMode::Append => {
            let mut seen: HashSet<ThreadKey> = existing.iter().map(|t| t.key.clone()).collect();
            let mut merged = existing;
            let mut added = 0;
            for key in incoming {
                if seen.insert(key.clone()) {
                    let name = account_name(account_names, key.account_index);
                    merged.push(ThreadRecord::stub(key.clone(), name));
                    added += 1;
                }
            }
            (merged, added)
        }
        ReconcileMode::Refresh => {
            let order: Vec<ThreadKey> = existing.iter().map(|t| t.key.clone()).collect();
            let mut by_key: HashMap<ThreadKey, ThreadRecord> =
                existing.into_iter().map(|t| (t.key.clone(), t)).collect();

            let mut merged = Vec::with_capacity(order.len().max(incoming.len()));
            let mut emitted = HashSet::new();
            let mut added = 0;

            for key in incoming {
                if !emitted.insert(key.clone()) {
                    continue;
                }
                let name = account_name(account_names, key.account_index);
                match by_key.remove(key) {
                    Some(mut record) => {
                        record.account_name = name;
                        // Listed by the inbox now, so it no longer depends on a search
                        record.search_only = false;
                        merged.push(record);
                    }
                    None => {
                        merged.push(ThreadRecord::stub(key.clone(), name));
                        added += 1;
                    }
                }
            }

            // Anything missing from this listing stays; only destructive
            // actions remove records.
            for key in order {
                if let Some(record) = by_key.remove(&key) {
                    merged.push(record);
                }
            }

            (merged, added)
        }
    }
}

impl AppState {
    pub(crate) fn on_inbox_loaded(
        &mut self,
        source: LoadSource,
        result: Result<Listing, GatewayError>,
    ) -> Vec<Effect> {
        self.inbox.loading = false;
        self.inbox.refreshing = false;
        self.inbox.loading_more = false;

        let listing = match result {
            Ok(listing) => listing,
            Err(e) => {
                tracing::warn!("Inbox load ({:?}) failed: {}", source, e);
                self.status.set_error(format!("Failed to load inbox: {}", e));
                return Vec::new();
            }
        };

        let mode = ReconcileMode::for_load(source, self.store.is_empty());
        let focus = self.focused_key();
        let existing = self.store.take_threads();
        let before = existing.len();
        let (merged, added) = reconcile(existing, &listing.keys, mode, &self.account_names);
        tracing::info!(
            "Inbox {:?} reconciled: existing={} incoming={} added={} total={}",
            mode,
            before,
            listing.keys.len(),
            added,
            merged.len()
        );

        self.store.replace_threads(merged);
        self.store.next_page_token = listing.next_page_token;
        if self.store.all_loaded() {
            self.store.sort_by_date();
        }
        self.after_store_change(focus);

        let mut effects = Vec::new();
        // Only a merge into existing content can surface new mail
        if mode == ReconcileMode::Refresh && source == LoadSource::Auto && added > 0 {
            effects.push(Effect::Notify { count: added });
        }
        if mode == ReconcileMode::Append {
            effects.extend(self.request_window());
        } else {
            effects.extend(self.request_backlog());
        }
        effects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::store::tests::{loaded, stub};

    fn names() -> Vec<String> {
        vec!["Personal".to_string(), "Work".to_string()]
    }

    fn key(id: &str) -> ThreadKey {
        ThreadKey::new(0, id)
    }

    fn ids(records: &[ThreadRecord]) -> Vec<&str> {
        records.iter().map(|t| t.key.thread_id.as_str()).collect()
    }

    #[test]
    fn test_refresh_keeps_existing_and_adds_new() {
        let a = loaded("A", 200);
        let b = loaded("B", 100);
        let (merged, added) = reconcile(
            vec![a.clone(), b.clone()],
            &[key("B"), key("C")],
            ReconcileMode::Refresh,
            &names(),
        );

        assert_eq!(added, 1);
        assert_eq!(merged.len(), 3);
        let find = |id: &str| merged.iter().find(|t| t.key.thread_id == id).unwrap();
        assert_eq!(find("A"), &a);
        assert_eq!(find("B"), &b);
        assert!(!find("C").loaded);
        // Listing order first, then records the listing no longer mentions
        assert_eq!(ids(&merged), vec!["B", "C", "A"]);
    }

    #[test]
    fn test_refresh_updates_account_name_only() {
        let mut b = loaded("B", 100);
        b.account_name = "Old name".to_string();
        b.unread = true;
        let (merged, _) = reconcile(vec![b], &[key("B")], ReconcileMode::Refresh, &names());
        assert_eq!(merged[0].account_name, "Personal");
        assert!(merged[0].unread);
        assert!(merged[0].loaded);
    }

    #[test]
    fn test_initial_tags_account_names() {
        let (merged, added) = reconcile(
            Vec::new(),
            &[ThreadKey::new(1, "w1"), key("p1")],
            ReconcileMode::Initial,
            &names(),
        );
        assert_eq!(added, 2);
        assert_eq!(merged[0].account_name, "Work");
        assert_eq!(merged[1].account_name, "Personal");
    }

    #[test]
    fn test_append_never_duplicates_keys() {
        let (merged, added) = reconcile(
            vec![loaded("A", 1), stub("B")],
            &[key("B"), key("C"), key("C")],
            ReconcileMode::Append,
            &names(),
        );
        assert_eq!(added, 1);
        assert_eq!(ids(&merged), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_keys_unique_across_mixed_sequence() {
        let mut records = Vec::new();
        let steps: [(&[&str], ReconcileMode); 4] = [
            (&["a", "b"], ReconcileMode::Initial),
            (&["b", "c"], ReconcileMode::Append),
            (&["d", "a", "d"], ReconcileMode::Refresh),
            (&["c", "e"], ReconcileMode::Append),
        ];
        for (listing, mode) in steps {
            let keys: Vec<ThreadKey> = listing.iter().map(|id| key(id)).collect();
            records = reconcile(records, &keys, mode, &names()).0;
            let unique: HashSet<&ThreadKey> = records.iter().map(|t| &t.key).collect();
            assert_eq!(unique.len(), records.len());
        }
        assert_eq!(records.len(), 5);
    }

    #[test]
    fn test_refresh_confirms_search_only_record() {
        let mut found = loaded("S", 5);
        found.search_only = true;
        let (merged, added) = reconcile(vec![found], &[key("S")], ReconcileMode::Refresh, &names());
        assert_eq!(added, 0);
        assert!(!merged[0].search_only);
    }

    #[test]
    fn test_mode_selection() {
        assert_eq!(
            ReconcileMode::for_load(LoadSource::Page, true),
            ReconcileMode::Append
        );
        assert_eq!(
            ReconcileMode::for_load(LoadSource::Auto, true),
            ReconcileMode::Initial
        );
        assert_eq!(
            ReconcileMode::for_load(LoadSource::Manual, false),
            ReconcileMode::Refresh
        );
    }
}
