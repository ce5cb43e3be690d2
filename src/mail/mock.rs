//! In-memory gateway for engine tests.
//!
//! Serves canned listings and metadata, records every call, and can be told
//! to fail specific operations for specific threads.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use super::error::GatewayError;
use super::gateway::{GatewayResult, MailGateway};
use super::types::{Message, Page, ThreadMetadata, ThreadStub};

/// A recorded call to the mock gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    ListInbox(Option<String>),
    Search(String),
    Metadata(String),
    Thread(String),
    SetUnread(String, bool),
    Archive(String),
    Unarchive(String),
    Trash(String),
    Untrash(String),
    Delete(String),
    Attachment(String, String),
}

/// Operations that can be made to fail per thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOp {
    Metadata,
    SetUnread,
    Archive,
    Unarchive,
    Trash,
    Untrash,
    Delete,
}

#[derive(Default)]
pub struct MockGateway {
    inbox: Mutex<Vec<String>>,
    next_page_token: Mutex<Option<String>>,
    search_results: Mutex<HashMap<String, Vec<String>>>,
    metadata: Mutex<HashMap<String, ThreadMetadata>>,
    messages: Mutex<HashMap<String, Vec<Message>>>,
    list_error: Mutex<Option<GatewayError>>,
    search_error: Mutex<Option<GatewayError>>,
    failures: Mutex<HashSet<(MockOp, String)>>,
    calls: Mutex<Vec<MockCall>>,
    metadata_delay: Mutex<Option<Duration>>,
    metadata_panics: Mutex<HashSet<String>>,
    attachments: Mutex<HashMap<(String, String), Vec<u8>>>,
    metadata_in_flight: AtomicUsize,
    metadata_peak: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inbox listing, newest first
    pub fn with_inbox(self, ids: &[&str]) -> Self {
        *lock(&self.inbox) = ids.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_next_page_token(self, token: &str) -> Self {
        *lock(&self.next_page_token) = Some(token.to_string());
        self
    }

    pub fn with_search(self, query: &str, ids: &[&str]) -> Self {
        lock(&self.search_results).insert(
            query.to_string(),
            ids.iter().map(|s| s.to_string()).collect(),
        );
        self
    }

    pub fn with_metadata(self, id: &str, meta: ThreadMetadata) -> Self {
        lock(&self.metadata).insert(id.to_string(), meta);
        self
    }

    pub fn with_messages(self, id: &str, messages: Vec<Message>) -> Self {
        lock(&self.messages).insert(id.to_string(), messages);
        self
    }

    /// Hold every metadata fetch open for `delay`
    pub fn with_metadata_delay(self, delay: Duration) -> Self {
        *lock(&self.metadata_delay) = Some(delay);
        self
    }

    /// Make the metadata fetch for `id` panic
    pub fn with_metadata_panic(self, id: &str) -> Self {
        lock(&self.metadata_panics).insert(id.to_string());
        self
    }

    /// Most metadata fetches ever running at once
    pub fn peak_metadata_in_flight(&self) -> usize {
        self.metadata_peak.load(Ordering::SeqCst)
    }

    pub fn with_attachment(self, message_id: &str, attachment_id: &str, data: &[u8]) -> Self {
        lock(&self.attachments).insert(
            (message_id.to_string(), attachment_id.to_string()),
            data.to_vec(),
        );
        self
    }

    pub fn with_list_error(self, err: GatewayError) -> Self {
        *lock(&self.list_error) = Some(err);
        self
    }

    pub fn with_search_error(self, err: GatewayError) -> Self {
        *lock(&self.search_error) = Some(err);
        self
    }

    /// Make `op` fail for `id` until cleared
    pub fn fail(&self, op: MockOp, id: &str) {
        lock(&self.failures).insert((op, id.to_string()));
    }

    pub fn with_failure(self, op: MockOp, id: &str) -> Self {
        self.fail(op, id);
        self
    }

    pub fn clear_failures(&self) {
        lock(&self.failures).clear();
    }

    pub fn calls(&self) -> Vec<MockCall> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    fn record(&self, call: MockCall) {
        lock(&self.calls).push(call);
    }

    fn check(&self, op: MockOp, id: &str) -> GatewayResult<()> {
        if lock(&self.failures).contains(&(op, id.to_string())) {
            Err(GatewayError::Transport(format!("{:?} failed for {}", op, id)))
        } else {
            Ok(())
        }
    }

    fn page(ids: &[String], token: Option<String>) -> Page {
        Page {
            threads: ids.iter().map(ThreadStub::new).collect(),
            next_page_token: token,
        }
    }
}

/// Metadata with sensible defaults for tests
pub fn test_metadata(subject: &str, timestamp: i64) -> ThreadMetadata {
    ThreadMetadata {
        subject: subject.to_string(),
        sender: "Alice <alice@example.com>".to_string(),
        snippet: format!("About {}", subject.to_lowercase()),
        timestamp,
        message_count: 1,
        unread: false,
        labels: vec!["INBOX".to_string()],
        has_attachment: false,
    }
}

#[async_trait]
impl MailGateway for MockGateway {
    async fn list_inbox(&self, page_size: u32, page_token: Option<&str>) -> GatewayResult<Page> {
        self.record(MockCall::ListInbox(page_token.map(str::to_string)));
        if let Some(err) = lock(&self.list_error).clone() {
            return Err(err);
        }
        let inbox = lock(&self.inbox);
        let ids: Vec<String> = inbox.iter().take(page_size as usize).cloned().collect();
        Ok(Self::page(&ids, lock(&self.next_page_token).clone()))
    }

    async fn search_inbox(
        &self,
        query: &str,
        _page_size: u32,
        _page_token: Option<&str>,
    ) -> GatewayResult<Page> {
        self.record(MockCall::Search(query.to_string()));
        if let Some(err) = lock(&self.search_error).clone() {
            return Err(err);
        }
        let ids = lock(&self.search_results)
            .get(query)
            .cloned()
            .unwrap_or_default();
        Ok(Self::page(&ids, None))
    }

    async fn thread_metadata(&self, thread_id: &str) -> GatewayResult<ThreadMetadata> {
        self.record(MockCall::Metadata(thread_id.to_string()));
        let running = self.metadata_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.metadata_peak.fetch_max(running, Ordering::SeqCst);
        let delay = *lock(&self.metadata_delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.metadata_in_flight.fetch_sub(1, Ordering::SeqCst);

        let should_panic = lock(&self.metadata_panics).contains(thread_id);
        if should_panic {
            panic!("metadata fetch for {} blew up", thread_id);
        }

        self.check(MockOp::Metadata, thread_id)?;
        lock(&self.metadata)
            .get(thread_id)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(thread_id.to_string()))
    }

    async fn thread(&self, thread_id: &str) -> GatewayResult<Vec<Message>> {
        self.record(MockCall::Thread(thread_id.to_string()));
        lock(&self.messages)
            .get(thread_id)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(thread_id.to_string()))
    }

    async fn set_unread(&self, thread_id: &str, unread: bool) -> GatewayResult<()> {
        self.record(MockCall::SetUnread(thread_id.to_string(), unread));
        self.check(MockOp::SetUnread, thread_id)
    }

    async fn archive(&self, thread_id: &str) -> GatewayResult<()> {
        self.record(MockCall::Archive(thread_id.to_string()));
        self.check(MockOp::Archive, thread_id)
    }

    async fn unarchive(&self, thread_id: &str) -> GatewayResult<()> {
        self.record(MockCall::Unarchive(thread_id.to_string()));
        self.check(MockOp::Unarchive, thread_id)
    }

    async fn trash(&self, thread_id: &str) -> GatewayResult<()> {
        self.record(MockCall::Trash(thread_id.to_string()));
        self.check(MockOp::Trash, thread_id)
    }

    async fn untrash(&self, thread_id: &str) -> GatewayResult<()> {
        self.record(MockCall::Untrash(thread_id.to_string()));
        self.check(MockOp::Untrash, thread_id)
    }

    async fn delete_permanently(&self, thread_id: &str) -> GatewayResult<()> {
        self.record(MockCall::Delete(thread_id.to_string()));
        self.check(MockOp::Delete, thread_id)
    }

    async fn attachment(&self, message_id: &str, attachment_id: &str) -> GatewayResult<Vec<u8>> {
        self.record(MockCall::Attachment(
            message_id.to_string(),
            attachment_id.to_string(),
        ));
        lock(&self.attachments)
            .get(&(message_id.to_string(), attachment_id.to_string()))
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(attachment_id.to_string()))
    }
}
