//! Application core - owns the state and runs the effects it requests

pub mod download;
pub mod event;
mod event_loop;
mod loader;
mod mutation;
pub mod reader;
pub mod render_thread;
mod search;
pub(crate) mod selection;
pub mod snapshot;
pub mod state;
pub(crate) mod store;
mod sync;
pub mod tasks;
pub mod undo;

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use render_thread::RenderThread;

use crate::account::AccountManager;
use crate::config::Config;
use crate::constants::EVENT_CHANNEL_CAPACITY;
use crate::input::KeyBindings;
use event::{AppEvent, Effect};
use state::AppState;
use tasks::TaskContext;

pub struct App {
    pub(crate) state: AppState,
    pub(crate) bindings: KeyBindings,
    pub(crate) tasks: TaskContext,
    pub(crate) event_rx: mpsc::Receiver<AppEvent>,
    /// Dirty flag: when true, UI needs re-render. Skips renders when nothing changed.
    pub(crate) dirty: bool,
}

impl App {
    pub fn new(config: &Config, accounts: AccountManager) -> Self {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let state = AppState::new(accounts.names(), config.ui.refresh_interval_secs);

        tracing::info!(
            "Starting with {} account(s), page size {}, refresh every {}s",
            accounts.count(),
            config.ui.page_size,
            config.ui.refresh_interval_secs
        );

        let tasks = TaskContext::new(
            Arc::new(accounts),
            config.ui.page_size,
            config.sync.metadata_concurrency,
            Duration::from_millis(config.sync.search_debounce_ms),
            Duration::from_secs(config.ui.refresh_interval_secs),
            event_tx,
        )
        .with_preview(config.notifications.show_preview)
        .with_download_dir(
            config
                .ui
                .download_dir
                .clone()
                .unwrap_or_else(download::downloads_dir),
        );

        Self {
            state,
            bindings: KeyBindings::new(),
            tasks,
            event_rx,
            dirty: true,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let render_thread = RenderThread::spawn()?;
        let result = self.event_loop(&render_thread).await;
        render_thread.shutdown();
        result
    }

    pub(crate) fn spawn_effects(&self, effects: Vec<Effect>) {
        for effect in effects {
            tracing::debug!("Spawning {:?}", effect);
            self.tasks.spawn(effect);
        }
    }
}
