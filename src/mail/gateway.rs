use async_trait::async_trait;

use super::error::GatewayError;
use super::types::{Message, Page, ThreadMetadata};

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Per-account access to the remote mail service.
///
/// Implementations must be cheap to share across tasks; the engine holds
/// each gateway behind an `Arc` and calls it from spawned tokio tasks.
#[async_trait]
pub trait MailGateway: Send + Sync {
    /// List inbox threads, newest first
    async fn list_inbox(&self, page_size: u32, page_token: Option<&str>) -> GatewayResult<Page>;

    /// Run a provider-side search query
    async fn search_inbox(
        &self,
        query: &str,
        page_size: u32,
        page_token: Option<&str>,
    ) -> GatewayResult<Page>;

    async fn thread_metadata(&self, thread_id: &str) -> GatewayResult<ThreadMetadata>;

    /// All messages of a thread, oldest first
    async fn thread(&self, thread_id: &str) -> GatewayResult<Vec<Message>>;

    async fn set_unread(&self, thread_id: &str, unread: bool) -> GatewayResult<()>;

    async fn archive(&self, thread_id: &str) -> GatewayResult<()>;
    async fn unarchive(&self, thread_id: &str) -> GatewayResult<()>;
    async fn trash(&self, thread_id: &str) -> GatewayResult<()>;
    async fn untrash(&self, thread_id: &str) -> GatewayResult<()>;
    async fn delete_permanently(&self, thread_id: &str) -> GatewayResult<()>;

    /// Decoded contents of one attachment of a message
    async fn attachment(&self, message_id: &str, attachment_id: &str) -> GatewayResult<Vec<u8>>;
}
