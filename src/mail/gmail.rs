//! Gmail REST API gateway
//!
//! Talks to `gmail/v1/users/me/threads` with a bearer token. Acquiring and
//! refreshing the token is handled outside this client; it only reads the
//! `access_token` field of the stored token file.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;

use super::error::GatewayError;
use super::gateway::{GatewayResult, MailGateway};
use super::types::{Attachment, Message, Page, ThreadMetadata, ThreadStub};

const API_BASE: &str = "https://gmail.googleapis.com/gmail/v1/users/me";
const INBOX_LABEL: &str = "INBOX";
const UNREAD_LABEL: &str = "UNREAD";

#[derive(Debug, Deserialize)]
struct StoredToken {
    access_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThreadListResponse {
    #[serde(default)]
    threads: Vec<ThreadRef>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ThreadRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ThreadResponse {
    #[serde(default)]
    messages: Vec<ApiMessage>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiMessage {
    #[serde(default)]
    id: String,
    #[serde(default)]
    thread_id: String,
    #[serde(default)]
    snippet: String,
    /// Milliseconds since epoch, sent as a string
    #[serde(default)]
    internal_date: Option<String>,
    #[serde(default)]
    label_ids: Vec<String>,
    payload: Option<MessagePart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessagePart {
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    filename: String,
    #[serde(default)]
    headers: Vec<Header>,
    body: Option<PartBody>,
    #[serde(default)]
    parts: Vec<MessagePart>,
}

#[derive(Debug, Deserialize)]
struct Header {
    name: String,
    value: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartBody {
    attachment_id: Option<String>,
    data: Option<String>,
    #[serde(default)]
    size: u64,
}

#[derive(Debug, Deserialize)]
struct AttachmentResponse {
    #[serde(default)]
    data: String,
}

impl ApiMessage {
    fn timestamp(&self) -> i64 {
        self.internal_date
            .as_deref()
            .and_then(|d| d.parse().ok())
            .unwrap_or(0)
    }

    fn header(&self, name: &str) -> String {
        self.payload
            .as_ref()
            .and_then(|p| p.headers.iter().find(|h| h.name.eq_ignore_ascii_case(name)))
            .map(|h| h.value.clone())
            .unwrap_or_default()
    }
}

impl MessagePart {
    fn has_attachment(&self) -> bool {
        let here = !self.filename.is_empty()
            && self
                .body
                .as_ref()
                .is_some_and(|b| b.attachment_id.is_some());
        here || self.parts.iter().any(MessagePart::has_attachment)
    }

    /// Every part that carries a file, depth first
    fn collect_attachments(&self, out: &mut Vec<Attachment>) {
        if let Some(id) = self.body.as_ref().and_then(|b| b.attachment_id.as_deref())
            && !self.filename.is_empty()
        {
            out.push(Attachment {
                filename: self.filename.clone(),
                mime_type: self.mime_type.clone(),
                size: self.body.as_ref().map_or(0, |b| b.size),
                attachment_id: id.to_string(),
            });
        }
        for part in &self.parts {
            part.collect_attachments(out);
        }
    }

    /// First text/plain body found in a depth-first walk
    fn plain_text(&self) -> Option<String> {
        if self.filename.is_empty() && self.mime_type.starts_with("text/plain") {
            if let Some(text) = self
                .body
                .as_ref()
                .and_then(|b| b.data.as_deref())
                .and_then(decode_body)
            {
                return Some(text);
            }
        }
        self.parts.iter().find_map(MessagePart::plain_text)
    }
}

/// Gmail encodes bodies and attachments as base64url, with or without padding
fn decode_base64url(data: &str) -> Option<Vec<u8>> {
    use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
    URL_SAFE_NO_PAD
        .decode(data)
        .or_else(|_| URL_SAFE.decode(data))
        .ok()
}

fn decode_body(data: &str) -> Option<String> {
    decode_base64url(data).map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
}

/// Summarize a thread from its latest message
fn to_metadata(messages: &[ApiMessage]) -> Option<ThreadMetadata> {
    let latest = messages.iter().max_by_key(|m| m.timestamp())?;
    Some(ThreadMetadata {
        subject: latest.header("Subject"),
        sender: latest.header("From"),
        snippet: latest.snippet.clone(),
        timestamp: latest.timestamp(),
        message_count: messages.len(),
        unread: messages
            .iter()
            .any(|m| m.label_ids.iter().any(|l| l == UNREAD_LABEL)),
        labels: latest.label_ids.clone(),
        has_attachment: latest
            .payload
            .as_ref()
            .is_some_and(MessagePart::has_attachment),
    })
}

fn to_message(msg: &ApiMessage) -> Message {
    Message {
        id: msg.id.clone(),
        thread_id: msg.thread_id.clone(),
        from: msg.header("From"),
        to: msg.header("To"),
        subject: msg.header("Subject"),
        snippet: msg.snippet.clone(),
        timestamp: msg.timestamp(),
        labels: msg.label_ids.clone(),
        body_text: msg
            .payload
            .as_ref()
            .and_then(MessagePart::plain_text)
            .unwrap_or_default(),
        attachments: {
            let mut attachments = Vec::new();
            if let Some(payload) = &msg.payload {
                payload.collect_attachments(&mut attachments);
            }
            attachments
        },
    }
}

pub struct GmailGateway {
    http: reqwest::Client,
    token: String,
}

impl GmailGateway {
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            http,
            token: token.into(),
        })
    }

    /// Build a client from a stored token file
    pub fn from_token_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read token file: {}", path.display()))?;
        let stored: StoredToken = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid token file: {}", path.display()))?;
        Self::new(stored.access_token)
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> GatewayResult<reqwest::Response> {
        let response = req.bearer_auth(&self.token).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(GatewayError::from_status(status.as_u16(), message))
    }

    async fn list(
        &self,
        query: Option<&str>,
        page_size: u32,
        page_token: Option<&str>,
    ) -> GatewayResult<Page> {
        let mut params: Vec<(&str, String)> = vec![
            ("labelIds", INBOX_LABEL.to_string()),
            ("maxResults", page_size.to_string()),
        ];
        if let Some(q) = query {
            params.push(("q", q.to_string()));
        }
        if let Some(token) = page_token.filter(|t| !t.is_empty()) {
            params.push(("pageToken", token.to_string()));
        }

        let req = self
            .http
            .get(format!("{}/threads", API_BASE))
            .query(&params);
        let body: ThreadListResponse = self.send(req).await?.json().await?;

        Ok(Page {
            threads: body
                .threads
                .into_iter()
                .map(|t| ThreadStub::new(t.id))
                .collect(),
            next_page_token: body.next_page_token.filter(|t| !t.is_empty()),
        })
    }

    async fn get_thread(&self, thread_id: &str, format: &str) -> GatewayResult<ThreadResponse> {
        let mut params = vec![("format", format)];
        if format == "metadata" {
            params.extend([
                ("metadataHeaders", "Subject"),
                ("metadataHeaders", "From"),
            ]);
        }
        let req = self
            .http
            .get(format!("{}/threads/{}", API_BASE, thread_id))
            .query(&params);
        Ok(self.send(req).await?.json().await?)
    }

    async fn modify(&self, thread_id: &str, add: &[&str], remove: &[&str]) -> GatewayResult<()> {
        let req = self
            .http
            .post(format!("{}/threads/{}/modify", API_BASE, thread_id))
            .json(&json!({ "addLabelIds": add, "removeLabelIds": remove }));
        self.send(req).await?;
        Ok(())
    }

    async fn post_action(&self, thread_id: &str, action: &str) -> GatewayResult<()> {
        let req = self
            .http
            .post(format!("{}/threads/{}/{}", API_BASE, thread_id, action));
        self.send(req).await?;
        Ok(())
    }
}

#[async_trait]
impl MailGateway for GmailGateway {
    async fn list_inbox(&self, page_size: u32, page_token: Option<&str>) -> GatewayResult<Page> {
        self.list(None, page_size, page_token).await
    }

    async fn search_inbox(
        &self,
        query: &str,
        page_size: u32,
        page_token: Option<&str>,
    ) -> GatewayResult<Page> {
        self.list(Some(query), page_size, page_token).await
    }

    async fn thread_metadata(&self, thread_id: &str) -> GatewayResult<ThreadMetadata> {
        let thread = self.get_thread(thread_id, "metadata").await?;
        to_metadata(&thread.messages)
            .ok_or_else(|| GatewayError::Decode(format!("thread {} has no messages", thread_id)))
    }

    async fn thread(&self, thread_id: &str) -> GatewayResult<Vec<Message>> {
        let thread = self.get_thread(thread_id, "full").await?;
        Ok(thread.messages.iter().map(to_message).collect())
    }

    async fn set_unread(&self, thread_id: &str, unread: bool) -> GatewayResult<()> {
        if unread {
            self.modify(thread_id, &[UNREAD_LABEL], &[]).await
        } else {
            self.modify(thread_id, &[], &[UNREAD_LABEL]).await
        }
    }

    async fn archive(&self, thread_id: &str) -> GatewayResult<()> {
        self.modify(thread_id, &[], &[INBOX_LABEL]).await
    }

    async fn unarchive(&self, thread_id: &str) -> GatewayResult<()> {
        self.modify(thread_id, &[INBOX_LABEL], &[]).await
    }

    async fn trash(&self, thread_id: &str) -> GatewayResult<()> {
        self.post_action(thread_id, "trash").await
    }

    async fn untrash(&self, thread_id: &str) -> GatewayResult<()> {
        self.post_action(thread_id, "untrash").await
    }

    async fn delete_permanently(&self, thread_id: &str) -> GatewayResult<()> {
        let req = self
            .http
            .delete(format!("{}/threads/{}", API_BASE, thread_id));
        self.send(req).await?;
        Ok(())
    }

    async fn attachment(&self, message_id: &str, attachment_id: &str) -> GatewayResult<Vec<u8>> {
        let req = self.http.get(format!(
            "{}/messages/{}/attachments/{}",
            API_BASE, message_id, attachment_id
        ));
        let body: AttachmentResponse = self.send(req).await?.json().await?;
        decode_base64url(&body.data)
            .ok_or_else(|| GatewayError::Decode(format!("attachment {} is not base64url", attachment_id)))
    }
}
