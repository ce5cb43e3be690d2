//! Local filtering and debounced remote search
//!
//! Every edit re-filters locally right away. A settled query also goes to
//! the server; its result is applied only if the session has not moved on
//! since (same generation, same query).

use std::collections::HashSet;

use aho_corasick::AhoCorasick;

use crate::mail::{GatewayError, ThreadKey, ThreadRecord};

use super::event::Effect;
use super::state::AppState;

/// A query is structured when any token uses field syntax (`from:bob`)
pub fn is_structured(query: &str) -> bool {
    query.split_whitespace().any(|term| term.contains(':'))
}

/// All-terms-must-match, case-insensitive substring matcher
#[derive(Debug, Clone)]
struct LocalMatcher {
    automaton: AhoCorasick,
    terms: usize,
}

impl LocalMatcher {
    fn new(query: &str) -> Option<Self> {
        let mut terms: Vec<String> = query
            .split_whitespace()
            .map(|t| t.to_lowercase())
            .collect();
        terms.sort();
        terms.dedup();
        if terms.is_empty() {
            return None;
        }
        match AhoCorasick::new(&terms) {
            Ok(automaton) => Some(Self {
                automaton,
                terms: terms.len(),
            }),
            Err(e) => {
                tracing::warn!("Failed to build search matcher: {}", e);
                None
            }
        }
    }

    fn matches(&self, thread: &ThreadRecord) -> bool {
        let haystack = [
            thread.subject.as_str(),
            thread.sender.as_str(),
            thread.snippet.as_str(),
            thread.account_name.as_str(),
        ]
        .join(" ")
        .to_lowercase();

        let mut seen = vec![false; self.terms];
        let mut remaining = self.terms;
        for m in self.automaton.find_overlapping_iter(&haystack) {
            let slot = &mut seen[m.pattern().as_usize()];
            if !*slot {
                *slot = true;
                remaining -= 1;
                if remaining == 0 {
                    return true;
                }
            }
        }
        false
    }
}

#[derive(Debug, Clone, Default)]
pub struct SearchSession {
    /// Trimmed live query; empty means no filter
    pub query: String,
    /// Bumped on every edit; stale remote results carry an older value
    pub generation: u64,
    /// Keys confirmed by the last accepted remote search
    pub remote_keys: Option<HashSet<ThreadKey>>,
    pub remote_loading: bool,
    matcher: Option<LocalMatcher>,
}

impl SearchSession {
    pub fn is_active(&self) -> bool {
        !self.query.is_empty()
    }

    pub fn is_structured(&self) -> bool {
        is_structured(&self.query)
    }

    fn set_query(&mut self, query: String) {
        if query != self.query || self.matcher.is_none() {
            self.matcher = if query.is_empty() || is_structured(&query) {
                None
            } else {
                LocalMatcher::new(&query)
            };
        }
        self.query = query;
    }

    /// True if a result tagged with `query`/`generation` belongs to this session
    pub fn is_current(&self, query: &str, generation: u64) -> bool {
        generation == self.generation && query.trim() == self.query
    }

    /// Whether `thread` passes the active filter
    pub fn matches(&self, thread: &ThreadRecord) -> bool {
        if !self.is_active() {
            return true;
        }
        if self.is_structured() {
            return self
                .remote_keys
                .as_ref()
                .is_some_and(|keys| keys.contains(&thread.key));
        }
        // Local queries only see hydrated records
        thread.loaded && self.matcher.as_ref().is_some_and(|m| m.matches(thread))
    }
}

impl AppState {
    /// Store indices passing the active filter, in store order
    pub(crate) fn compute_filter(&self) -> Option<Vec<usize>> {
        if !self.search.is_active() {
            return None;
        }
        Some(
            self.store
                .iter()
                .enumerate()
                .filter(|(_, t)| self.search.matches(t))
                .map(|(i, _)| i)
                .collect(),
        )
    }

    pub(crate) fn apply_filter(&mut self, query: &str) {
        let focus = self.focused_key();
        self.apply_filter_with_focus(query, focus);
    }

    fn apply_filter_with_focus(&mut self, query: &str, focus: Option<ThreadKey>) {
        let query = query.trim();
        let changed = query != self.search.query;

        // A different query must not inherit the previous one's results
        if changed && self.search.is_active() {
            self.store.prune_search_only();
        }
        if changed {
            self.search.remote_keys = None;
        }
        self.search.set_query(query.to_string());

        if query.is_empty() {
            tracing::debug!("Search cleared");
            self.search.remote_loading = false;
            self.search.generation += 1;
            self.search.remote_keys = None;
            self.store.prune_search_only();
            self.selection.prune(&self.store);
            self.filtered = None;
            self.restore_focus(focus);
            return;
        }

        self.selection.prune(&self.store);
        self.filtered = self.compute_filter();
        self.cursor = 0;
        if self.search.is_structured() {
            tracing::debug!(
                "Structured query {:?} matched {} confirmed threads",
                query,
                self.display_count()
            );
            self.clamp_cursor();
        } else {
            tracing::debug!("Local query {:?} matched {}", query, self.display_count());
            self.restore_focus(focus);
        }
    }

    /// Apply an edited query and arm the remote debounce
    pub(crate) fn edit_query(&mut self, text: &str) -> Vec<Effect> {
        self.apply_filter(text);
        self.search.generation += 1;
        if self.search.query.is_empty() {
            self.search.remote_loading = false;
            return Vec::new();
        }
        vec![Effect::ArmSearchDebounce {
            query: self.search.query.clone(),
            generation: self.search.generation,
        }]
    }

    pub(crate) fn on_search_debounced(&mut self, query: String, generation: u64) -> Vec<Effect> {
        if !self.search.is_current(&query, generation) {
            tracing::debug!(
                "Search debounce for {:?} (gen {}) is stale, current gen {}",
                query,
                generation,
                self.search.generation
            );
            return Vec::new();
        }
        if self.search.query.is_empty() {
            self.search.remote_loading = false;
            return Vec::new();
        }
        self.search.remote_loading = true;
        vec![Effect::RemoteSearch {
            query: self.search.query.clone(),
            generation,
        }]
    }

    pub(crate) fn on_search_loaded(
        &mut self,
        query: String,
        generation: u64,
        result: Result<Vec<ThreadKey>, GatewayError>,
    ) -> Vec<Effect> {
        if !self.search.is_current(&query, generation) {
            tracing::debug!("Dropping stale search result for {:?} (gen {})", query, generation);
            return Vec::new();
        }
        self.search.remote_loading = false;

        let keys = match result {
            Ok(keys) => keys,
            Err(e) => {
                self.status.set_error(format!("Search failed: {}", e));
                return Vec::new();
            }
        };

        let focus = self.focused_key();
        self.search.remote_keys = Some(keys.iter().cloned().collect());
        self.store.prune_search_only();
        let records = keys.into_iter().map(|key| {
            let name = self
                .account_names
                .get(key.account_index)
                .cloned()
                .unwrap_or_default();
            let mut record = ThreadRecord::stub(key, name);
            record.search_only = true;
            record
        });
        let added = self.store.append_new(records.collect::<Vec<_>>());
        tracing::debug!(
            "Search {:?} merged {} new threads, total {}",
            self.search.query,
            added.len(),
            self.store.len()
        );

        let query = self.search.query.clone();
        self.apply_filter_with_focus(&query, focus);
        self.hydrate_keys(added)
    }

    // Search prompt editing

    pub(crate) fn open_search(&mut self) {
        let previous = self.search.query.clone();
        self.mode = super::state::Mode::Search {
            input: previous.clone(),
            previous,
        };
    }

    pub(crate) fn search_input_changed(&mut self, edit: impl FnOnce(&mut String)) -> Vec<Effect> {
        let text = match &mut self.mode {
            super::state::Mode::Search { input, .. } => {
                edit(input);
                input.clone()
            }
            _ => return Vec::new(),
        };
        self.edit_query(&text)
    }

    pub(crate) fn submit_search(&mut self) -> Vec<Effect> {
        let text = match std::mem::take(&mut self.mode) {
            super::state::Mode::Search { input, .. } => input,
            other => {
                self.mode = other;
                return Vec::new();
            }
        };
        let mut effects = self.edit_query(&text);
        effects.extend(self.request_window());
        effects
    }

    pub(crate) fn cancel_search(&mut self) -> Vec<Effect> {
        let previous = match std::mem::take(&mut self.mode) {
            super::state::Mode::Search { previous, .. } => previous,
            other => {
                self.mode = other;
                return Vec::new();
            }
        };
        if previous.trim() == self.search.query {
            return Vec::new();
        }
        self.edit_query(&previous)
    }
}
