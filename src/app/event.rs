//! Typed results of asynchronous work and the follow-up work they request.
//!
//! Every spawned task finishes by posting exactly one [`AppEvent`] to the
//! event loop. Applying an event (or a user action) to the state yields zero
//! or more [`Effect`]s for the runtime to spawn.

use std::path::PathBuf;

use crate::mail::{Attachment, GatewayError, Message, ThreadKey, ThreadMetadata};

use super::undo::DestructiveAction;

/// Why an inbox listing was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Initial,
    Manual,
    /// Background timer; the only source that notifies on new mail
    Auto,
    /// Next page of the first account
    Page,
}

/// Listing merged across accounts, in account order
#[derive(Debug, Clone, Default)]
pub struct Listing {
    pub keys: Vec<ThreadKey>,
    pub next_page_token: Option<String>,
}

pub type MetadataResult = (ThreadKey, Result<ThreadMetadata, GatewayError>);

#[derive(Debug, Clone)]
pub enum AppEvent {
    InboxLoaded {
        source: LoadSource,
        result: Result<Listing, GatewayError>,
    },
    /// One backlog fetch
    MetadataLoaded {
        key: ThreadKey,
        result: Result<ThreadMetadata, GatewayError>,
    },
    /// Every fetch of one windowed batch
    MetadataBatchLoaded { results: Vec<MetadataResult> },
    SearchDebounced { query: String, generation: u64 },
    SearchLoaded {
        query: String,
        generation: u64,
        result: Result<Vec<ThreadKey>, GatewayError>,
    },
    ThreadMarked {
        key: ThreadKey,
        unread: bool,
        result: Result<(), GatewayError>,
    },
    ThreadsActioned {
        action: DestructiveAction,
        refs: Vec<ThreadKey>,
        failed: Vec<(ThreadKey, GatewayError)>,
    },
    ThreadsUndone {
        action: DestructiveAction,
        refs: Vec<ThreadKey>,
        failed: Vec<(ThreadKey, GatewayError)>,
    },
    ThreadLoaded {
        key: ThreadKey,
        result: Result<Vec<Message>, GatewayError>,
    },
    /// Download finished; errors cover both the fetch and the write
    AttachmentSaved {
        filename: String,
        result: Result<PathBuf, String>,
    },
    /// Attachment bytes for the text preview
    AttachmentLoaded {
        message_id: String,
        attachment: Attachment,
        result: Result<Vec<u8>, GatewayError>,
    },
    AutoRefresh,
}

/// Work the runtime should start on behalf of the state
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    LoadInbox(LoadSource),
    LoadMore { token: String },
    /// Bounded-concurrency fetch, applied as one batch
    HydrateWindow(Vec<ThreadKey>),
    /// One independent fetch per key, applied as each completes
    HydrateBacklog(Vec<ThreadKey>),
    ArmSearchDebounce { query: String, generation: u64 },
    RemoteSearch { query: String, generation: u64 },
    SetUnread { key: ThreadKey, unread: bool },
    RunAction {
        action: DestructiveAction,
        refs: Vec<ThreadKey>,
    },
    RunUndo {
        action: DestructiveAction,
        refs: Vec<ThreadKey>,
    },
    FetchThread(ThreadKey),
    DownloadAttachment {
        account_index: usize,
        message_id: String,
        attachment: Attachment,
    },
    PreviewAttachment {
        account_index: usize,
        message_id: String,
        attachment: Attachment,
    },
    /// New mail arrived during a background refresh
    Notify { count: usize },
    ScheduleAutoRefresh,
}
