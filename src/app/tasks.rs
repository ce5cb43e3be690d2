//! Effect runner
//!
//! Each [`Effect`] becomes one tokio task that talks to the gateways and
//! reports back over the event channel. Tasks never touch `AppState`.

use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::join_all;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;

use crate::account::AccountManager;
use crate::mail::{Attachment, GatewayError, MailGateway, ThreadKey};

use super::event::{AppEvent, Effect, Listing, LoadSource, MetadataResult};
use super::undo::DestructiveAction;

/// Everything a task needs. Cheap to clone into each spawned task.
#[derive(Clone)]
pub struct TaskContext {
    accounts: Arc<AccountManager>,
    page_size: u32,
    concurrency: usize,
    debounce: Duration,
    refresh_interval: Duration,
    show_preview: bool,
    download_dir: PathBuf,
    event_tx: mpsc::Sender<AppEvent>,
}

impl TaskContext {
    pub fn new(
        accounts: Arc<AccountManager>,
        page_size: u32,
        concurrency: usize,
        debounce: Duration,
        refresh_interval: Duration,
        event_tx: mpsc::Sender<AppEvent>,
    ) -> Self {
        Self {
            accounts,
            page_size: page_size.max(1),
            concurrency: concurrency.max(1),
            debounce,
            refresh_interval,
            show_preview: true,
            download_dir: PathBuf::from("."),
            event_tx,
        }
    }

    /// Whether new-mail notifications name the accounts
    pub fn with_preview(mut self, show_preview: bool) -> Self {
        self.show_preview = show_preview;
        self
    }

    /// Where downloaded attachments are written
    pub fn with_download_dir(mut self, dir: PathBuf) -> Self {
        self.download_dir = dir;
        self
    }

    /// Start an effect in the background
    pub fn spawn(&self, effect: Effect) {
        let ctx = self.clone();
        tokio::spawn(async move { ctx.run(effect).await });
    }

    async fn send(&self, event: AppEvent) {
        if self.event_tx.send(event).await.is_err() {
            tracing::debug!("Event loop gone, dropping task result");
        }
    }

    /// Run an effect to completion, posting its result event(s)
    pub async fn run(&self, effect: Effect) {
        match effect {
            Effect::LoadInbox(source) => {
                let result = self.list_all().await;
                self.send(AppEvent::InboxLoaded { source, result }).await;
            }
            Effect::LoadMore { token } => {
                let result = self.list_more(&token).await;
                self.send(AppEvent::InboxLoaded {
                    source: LoadSource::Page,
                    result,
                })
                .await;
            }
            Effect::HydrateWindow(keys) => {
                let results = self.fetch_window(keys).await;
                self.send(AppEvent::MetadataBatchLoaded { results }).await;
            }
            Effect::HydrateBacklog(keys) => self.fetch_backlog(keys),
            Effect::ArmSearchDebounce { query, generation } => {
                tokio::time::sleep(self.debounce).await;
                self.send(AppEvent::SearchDebounced { query, generation })
                    .await;
            }
            Effect::RemoteSearch { query, generation } => {
                let result = self.search_all(&query).await;
                self.send(AppEvent::SearchLoaded {
                    query,
                    generation,
                    result,
                })
                .await;
            }
            Effect::SetUnread { key, unread } => {
                let result = match self.accounts.gateway(key.account_index) {
                    Ok(gateway) => gateway.set_unread(&key.thread_id, unread).await,
                    Err(e) => Err(e),
                };
                self.send(AppEvent::ThreadMarked {
                    key,
                    unread,
                    result,
                })
                .await;
            }
            Effect::RunAction { action, refs } => {
                let failed = self.for_each_ref(&refs, action, false).await;
                self.send(AppEvent::ThreadsActioned {
                    action,
                    refs,
                    failed,
                })
                .await;
            }
            Effect::RunUndo { action, refs } => {
                let failed = self.for_each_ref(&refs, action, true).await;
                self.send(AppEvent::ThreadsUndone {
                    action,
                    refs,
                    failed,
                })
                .await;
            }
            Effect::FetchThread(key) => {
                let result = match self.accounts.gateway(key.account_index) {
                    Ok(gateway) => gateway.thread(&key.thread_id).await,
                    Err(e) => Err(e),
                };
                self.send(AppEvent::ThreadLoaded { key, result }).await;
            }
            Effect::DownloadAttachment {
                account_index,
                message_id,
                attachment,
            } => {
                let filename = attachment.filename.clone();
                let result = self.download(account_index, &message_id, attachment).await;
                self.send(AppEvent::AttachmentSaved { filename, result }).await;
            }
            Effect::PreviewAttachment {
                account_index,
                message_id,
                attachment,
            } => {
                let result = self
                    .fetch_attachment(account_index, &message_id, &attachment)
                    .await;
                self.send(AppEvent::AttachmentLoaded {
                    message_id,
                    attachment,
                    result,
                })
                .await;
            }
            Effect::Notify { count } => {
                if !self.accounts.any_notifications() {
                    return;
                }
                let names: Vec<String> = self
                    .accounts
                    .iter_enumerated()
                    .filter(|(_, h)| h.notifications)
                    .map(|(_, h)| h.name.clone())
                    .collect();
                let show_preview = self.show_preview;
                // Desktop notification backends block
                let shown = tokio::task::spawn_blocking(move || {
                    crate::notification::notify_new_mail(count, &names, show_preview)
                })
                .await;
                if let Err(e) = shown {
                    tracing::warn!("Notification task failed: {}", e);
                }
            }
            Effect::ScheduleAutoRefresh => {
                if self.refresh_interval.is_zero() {
                    return;
                }
                tokio::time::sleep(self.refresh_interval).await;
                self.send(AppEvent::AutoRefresh).await;
            }
        }
    }

    /// First page of every account, merged in account order. Any failure
    /// fails the whole listing so a partial result never looks like removals.
    async fn list_all(&self) -> Result<Listing, GatewayError> {
        let mut join_set = JoinSet::new();
        for (index, handle) in self.accounts.iter_enumerated() {
            let gateway = Arc::clone(&handle.gateway);
            let page_size = self.page_size;
            join_set.spawn(async move { (index, gateway.list_inbox(page_size, None).await) });
        }

        let mut pages = Vec::with_capacity(self.accounts.count());
        while let Some(joined) = join_set.join_next().await {
            let (index, result) = joined.map_err(|e| GatewayError::Transport(e.to_string()))?;
            match result {
                Ok(page) => pages.push((index, page)),
                Err(e) => {
                    tracing::warn!("Listing account {} failed: {}", index, e);
                    return Err(e);
                }
            }
        }
        pages.sort_by_key(|(index, _)| *index);

        let mut listing = Listing::default();
        for (index, page) in pages {
            if index == 0 {
                listing.next_page_token = page.next_page_token;
            }
            listing.keys.extend(
                page.threads
                    .into_iter()
                    .map(|t| ThreadKey::new(index, t.thread_id)),
            );
        }
        Ok(listing)
    }

    /// Next page; pagination only follows the first account
    async fn list_more(&self, token: &str) -> Result<Listing, GatewayError> {
        let gateway = self.accounts.gateway(0)?;
        let page = gateway.list_inbox(self.page_size, Some(token)).await?;
        Ok(Listing {
            keys: page
                .threads
                .into_iter()
                .map(|t| ThreadKey::new(0, t.thread_id))
                .collect(),
            next_page_token: page.next_page_token,
        })
    }

    /// Search every account. Accounts that fail are skipped; the search
    /// only fails when all of them do.
    async fn search_all(&self, query: &str) -> Result<Vec<ThreadKey>, GatewayError> {
        let searches = self.accounts.iter_enumerated().map(|(index, handle)| {
            let gateway = Arc::clone(&handle.gateway);
            let page_size = self.page_size;
            async move { (index, gateway.search_inbox(query, page_size, None).await) }
        });

        let mut keys = Vec::new();
        let mut first_error = None;
        let mut succeeded = 0;
        for (index, result) in join_all(searches).await {
            match result {
                Ok(page) => {
                    succeeded += 1;
                    keys.extend(
                        page.threads
                            .into_iter()
                            .map(|t| ThreadKey::new(index, t.thread_id)),
                    );
                }
                Err(e) => {
                    tracing::warn!("Search on account {} failed: {}", index, e);
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) if succeeded == 0 => Err(e),
            _ => Ok(keys),
        }
    }

    /// Bounded worker pool; every result comes back in one batch, one per key
    async fn fetch_window(&self, keys: Vec<ThreadKey>) -> Vec<MetadataResult> {
        let semaphore = Semaphore::new(self.concurrency);
        let fetches = keys.into_iter().map(|key| {
            let semaphore = &semaphore;
            async move {
                let fetch = async {
                    let gateway = self.accounts.gateway(key.account_index)?;
                    let _permit = semaphore
                        .acquire()
                        .await
                        .map_err(|e| GatewayError::Transport(e.to_string()))?;
                    gateway.thread_metadata(&key.thread_id).await
                };
                // A panicking fetch still reports so its key is released
                let result = match AssertUnwindSafe(fetch).catch_unwind().await {
                    Ok(result) => result,
                    Err(_) => {
                        tracing::error!("Metadata fetch for {} panicked", key);
                        Err(GatewayError::Transport("metadata fetch panicked".to_string()))
                    }
                };
                (key, result)
            }
        });

        let results = join_all(fetches).await;
        tracing::debug!("Window hydration finished: {} results", results.len());
        results
    }

    async fn fetch_attachment(
        &self,
        account_index: usize,
        message_id: &str,
        attachment: &Attachment,
    ) -> Result<Vec<u8>, GatewayError> {
        let gateway = self.accounts.gateway(account_index)?;
        gateway.attachment(message_id, &attachment.attachment_id).await
    }

    /// Fetch and write to the downloads folder
    async fn download(
        &self,
        account_index: usize,
        message_id: &str,
        attachment: Attachment,
    ) -> Result<PathBuf, String> {
        let data = self
            .fetch_attachment(account_index, message_id, &attachment)
            .await
            .map_err(|e| e.to_string())?;
        let dir = self.download_dir.clone();
        tokio::task::spawn_blocking(move || {
            super::download::save_into(&dir, &attachment.filename, &data)
        })
        .await
        .map_err(|e| format!("save task failed: {}", e))?
    }

    /// One independent task per key, each reporting on its own
    fn fetch_backlog(&self, keys: Vec<ThreadKey>) {
        for key in keys {
            let ctx = self.clone();
            tokio::spawn(async move {
                let result = match ctx.accounts.gateway(key.account_index) {
                    Ok(gateway) => gateway.thread_metadata(&key.thread_id).await,
                    Err(e) => Err(e),
                };
                ctx.send(AppEvent::MetadataLoaded { key, result }).await;
            });
        }
    }

    /// Apply an action (or its inverse) to every ref. Returns the failures
    /// in ref order.
    async fn for_each_ref(
        &self,
        refs: &[ThreadKey],
        action: DestructiveAction,
        undo: bool,
    ) -> Vec<(ThreadKey, GatewayError)> {
        let calls = refs.iter().map(|key| async move {
            let result = match self.accounts.gateway(key.account_index) {
                Ok(gateway) => apply_one(gateway.as_ref(), &key.thread_id, action, undo).await,
                Err(e) => Err(e),
            };
            result.err().map(|e| (key.clone(), e))
        });
        let failed: Vec<_> = join_all(calls).await.into_iter().flatten().collect();
        if !failed.is_empty() {
            tracing::warn!(
                "{:?} (undo={}) failed for {} of {} threads",
                action,
                undo,
                failed.len(),
                refs.len()
            );
        }
        failed
    }
}

async fn apply_one(
    gateway: &dyn MailGateway,
    thread_id: &str,
    action: DestructiveAction,
    undo: bool,
) -> Result<(), GatewayError> {
    match (action, undo) {
        (DestructiveAction::Archive, false) => gateway.archive(thread_id).await,
        (DestructiveAction::Archive, true) => gateway.unarchive(thread_id).await,
        (DestructiveAction::Trash, false) => gateway.trash(thread_id).await,
        (DestructiveAction::Trash, true) => gateway.untrash(thread_id).await,
        (DestructiveAction::DeletePermanently, false) => {
            gateway.delete_permanently(thread_id).await
        }
        (DestructiveAction::DeletePermanently, true) => Err(GatewayError::Unsupported(
            "permanent delete cannot be undone".to_string(),
        )),
    }
}
