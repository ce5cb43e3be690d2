//! Metadata hydration bookkeeping
//!
//! Two ways in: a windowed batch for rows on screen, and a backlog that
//! streams every remaining stub one fetch at a time. Both go through
//! [`LoadCursor`] so a key never has two fetches outstanding.

use std::collections::HashSet;

use crate::mail::{GatewayError, ThreadKey, ThreadMetadata};

use super::event::{Effect, MetadataResult};
use super::state::AppState;

/// Keys with a metadata fetch in flight
#[derive(Debug, Clone, Default)]
pub struct LoadCursor {
    in_flight: HashSet<ThreadKey>,
}

impl LoadCursor {
    /// Mark keys as in flight, returning only those that were not already
    pub fn claim(&mut self, keys: impl IntoIterator<Item = ThreadKey>) -> Vec<ThreadKey> {
        keys.into_iter()
            .filter(|key| self.in_flight.insert(key.clone()))
            .collect()
    }

    pub fn finish(&mut self, key: &ThreadKey) {
        self.in_flight.remove(key);
    }

    /// Loading counter shown in the status bar
    pub fn count(&self) -> usize {
        self.in_flight.len()
    }
}

impl AppState {
    /// Hydrate unhydrated rows currently on screen
    pub(crate) fn request_window(&mut self) -> Vec<Effect> {
        let keys: Vec<ThreadKey> = self
            .visible_indices()
            .into_iter()
            .filter_map(|idx| self.store.get(idx))
            .filter(|t| !t.loaded)
            .map(|t| t.key.clone())
            .collect();
        let claimed = self.loader.claim(keys);
        if claimed.is_empty() {
            return Vec::new();
        }
        tracing::debug!("Hydrating {} visible threads", claimed.len());
        vec![Effect::HydrateWindow(claimed)]
    }

    /// Hydrate every remaining stub, one fetch per record
    pub(crate) fn request_backlog(&mut self) -> Vec<Effect> {
        let keys = self.store.unloaded_keys();
        self.hydrate_keys(keys)
    }

    pub(crate) fn hydrate_keys(&mut self, keys: Vec<ThreadKey>) -> Vec<Effect> {
        let claimed = self.loader.claim(keys);
        if claimed.is_empty() {
            return Vec::new();
        }
        tracing::debug!("Hydrating backlog of {} threads", claimed.len());
        vec![Effect::HydrateBacklog(claimed)]
    }

    /// Apply one result without re-sorting. Returns true if a record changed.
    fn apply_metadata(
        &mut self,
        key: &ThreadKey,
        result: Result<ThreadMetadata, GatewayError>,
    ) -> bool {
        self.loader.finish(key);
        let meta = match result {
            Ok(meta) => meta,
            Err(e) => {
                // Stays a stub; the next window or refresh tries again
                tracing::warn!("Metadata load failed for {}: {}", key, e);
                return false;
            }
        };
        match self.store.find_mut(key) {
            Some(record) => {
                record.hydrate(meta);
                true
            }
            None => {
                tracing::debug!("Metadata for {} arrived after it left the store", key);
                false
            }
        }
    }

    pub(crate) fn on_metadata_loaded(
        &mut self,
        key: ThreadKey,
        result: Result<ThreadMetadata, GatewayError>,
    ) -> Vec<Effect> {
        let focus = self.focused_key();
        if self.apply_metadata(&key, result) {
            self.store.sort_by_date();
            self.after_store_change(focus);
        }
        Vec::new()
    }

    pub(crate) fn on_metadata_batch_loaded(&mut self, results: Vec<MetadataResult>) -> Vec<Effect> {
        let focus = self.focused_key();
        let mut changed = 0;
        for (key, result) in results {
            if self.apply_metadata(&key, result) {
                changed += 1;
            }
        }
        if changed > 0 {
            self.store.sort_by_date();
            self.after_store_change(focus);
        }
        Vec::new()
    }
}
