//! Main event loop: task results, input, and rendering

use anyhow::Result;
use crossterm::event::{self, Event};
use std::time::Duration;

use crate::constants::{POLL_BUSY_MS, POLL_IDLE_MS};
use crate::input::{InputResult, handle_input};

use super::App;
use super::render_thread::RenderThread;
use super::snapshot::Snapshot;

impl App {
    pub(crate) async fn event_loop(&mut self, render_thread: &RenderThread) -> Result<()> {
        let effects = self.state.start();
        self.spawn_effects(effects);

        // Size the viewport before the first page arrives
        if let Ok((_, height)) = crossterm::terminal::size() {
            let effects = self.state.on_resize(crate::ui::list_rows(height));
            self.spawn_effects(effects);
        }

        loop {
            // Task results first; the last one applied carries a fresh snapshot
            let mut latest = self.process_task_events();
            if latest.is_some() {
                self.dirty = true;
            }

            if self.state.status.clear_error_if_expired() {
                latest = None;
                self.dirty = true;
            }

            if self.dirty {
                let snapshot = latest.unwrap_or_else(|| self.state.snapshot());
                if render_thread.render(snapshot) {
                    self.dirty = false;
                }
            }

            // Adaptive timeout: faster while work is in flight
            let busy = self.state.inbox.busy()
                || self.state.loader.count() > 0
                || self.state.search.remote_loading
                || self.state.destructive_in_progress
                || self.state.undo_in_progress;
            let poll_timeout = if busy { POLL_BUSY_MS } else { POLL_IDLE_MS };

            if event::poll(Duration::from_millis(poll_timeout))? {
                let evt = event::read()?;
                // Any input event (including resize) requires re-render
                self.dirty = true;

                if let Event::Resize(_, height) = evt {
                    let effects = self.state.on_resize(crate::ui::list_rows(height));
                    self.spawn_effects(effects);
                    continue;
                }

                let effects = match handle_input(evt, &self.state, &self.bindings) {
                    InputResult::Quit => break,
                    InputResult::Action(action) => {
                        self.state.status.dismiss();
                        self.state.handle_action(action)
                    }
                    InputResult::Char(c) => {
                        self.state.status.dismiss();
                        self.state.handle_char(c)
                    }
                    InputResult::Backspace => {
                        self.state.status.dismiss();
                        self.state.handle_backspace()
                    }
                    InputResult::Continue => Vec::new(),
                };
                self.spawn_effects(effects);
            }
        }

        Ok(())
    }

    /// Drain finished task results. Returns the snapshot after the last one,
    /// or None if nothing arrived.
    fn process_task_events(&mut self) -> Option<Snapshot> {
        let mut latest = None;
        while let Ok(event) = self.event_rx.try_recv() {
            tracing::trace!("Applying {:?}", event);
            let (snapshot, effects) = self.state.update(event);
            self.spawn_effects(effects);
            latest = Some(snapshot);
        }
        latest
    }
}
