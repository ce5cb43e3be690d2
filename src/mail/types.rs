use std::fmt;

use chrono::{DateTime, Local};

/// Identity of a thread across all accounts.
///
/// Thread ids are only unique within one account, so the account index is
/// part of the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThreadKey {
    pub account_index: usize,
    pub thread_id: String,
}

impl ThreadKey {
    pub fn new(account_index: usize, thread_id: impl Into<String>) -> Self {
        Self {
            account_index,
            thread_id: thread_id.into(),
        }
    }
}

impl fmt::Display for ThreadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.thread_id, self.account_index)
    }
}

/// A thread identity as returned by a listing or search, without metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadStub {
    pub thread_id: String,
}

impl ThreadStub {
    pub fn new(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
        }
    }
}

/// One page of a listing or search
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub threads: Vec<ThreadStub>,
    pub next_page_token: Option<String>,
}

/// Display metadata for a thread, taken from its latest message
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThreadMetadata {
    pub subject: String,
    pub sender: String,
    pub snippet: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    pub message_count: usize,
    pub unread: bool,
    pub labels: Vec<String>,
    pub has_attachment: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThreadRecord {
    pub key: ThreadKey,
    /// Display-only; refreshed from the account list on every reconcile
    pub account_name: String,
    pub subject: String,
    pub sender: String,
    pub snippet: String,
    pub timestamp: i64,
    pub message_count: usize,
    pub unread: bool,
    pub labels: Vec<String>,
    pub has_attachment: bool,
    /// Metadata has been fetched
    pub loaded: bool,
    /// Present only as an unconfirmed remote search result
    pub search_only: bool,
}

impl ThreadRecord {
    /// Unhydrated record for a listed or searched thread
    pub fn stub(key: ThreadKey, account_name: impl Into<String>) -> Self {
        Self {
            key,
            account_name: account_name.into(),
            subject: String::new(),
            sender: String::new(),
            snippet: String::new(),
            timestamp: 0,
            message_count: 0,
            unread: false,
            labels: Vec::new(),
            has_attachment: false,
            loaded: false,
            search_only: false,
        }
    }

    /// Attach fetched metadata. Identity, account name and the search-only
    /// marker belong to the store and are left alone.
    pub fn hydrate(&mut self, meta: ThreadMetadata) {
        self.subject = meta.subject;
        self.sender = meta.sender;
        self.snippet = meta.snippet;
        self.timestamp = meta.timestamp;
        self.message_count = meta.message_count;
        self.unread = meta.unread;
        self.labels = meta.labels;
        self.has_attachment = meta.has_attachment;
        self.loaded = true;
    }

    pub fn local_time(&self) -> Option<DateTime<Local>> {
        if !self.loaded {
            return None;
        }
        DateTime::from_timestamp_millis(self.timestamp).map(|dt| dt.with_timezone(&Local))
    }
}

/// A file attached to a message. The data is fetched separately.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub mime_type: String,
    /// Decoded size in bytes
    pub size: u64,
    pub attachment_id: String,
}

impl Attachment {
    /// Readable as text, so it can be previewed inline
    pub fn is_text(&self) -> bool {
        let mime = self.mime_type.to_ascii_lowercase();
        if mime.starts_with("text/")
            || mime.ends_with("+xml")
            || matches!(
                mime.as_str(),
                "application/json" | "application/xml" | "application/yaml"
            )
        {
            return true;
        }
        let ext = std::path::Path::new(&self.filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        matches!(
            ext.as_deref(),
            Some("md" | "markdown" | "txt" | "log" | "json" | "xml" | "yml" | "yaml" | "csv")
        )
    }

    /// "12 KB" style size for lists
    pub fn display_size(&self) -> String {
        const KB: u64 = 1024;
        const MB: u64 = KB * 1024;
        match self.size {
            s if s >= MB => format!("{:.1} MB", s as f64 / MB as f64),
            s if s >= KB => format!("{} KB", s / KB),
            s => format!("{} B", s),
        }
    }
}

/// A single message of an opened thread
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Message {
    pub id: String,
    pub thread_id: String,
    pub from: String,
    pub to: String,
    pub subject: String,
    pub snippet: String,
    pub timestamp: i64,
    pub labels: Vec<String>,
    pub body_text: String,
    pub attachments: Vec<Attachment>,
}
