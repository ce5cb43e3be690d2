//! Thread reader: message selection, expand/collapse, and attachments
//!
//! The reader shows one thread newest first. The cursor moves between
//! messages; only expanded messages show their body. Attachments of the
//! selected message open in a modal from which they can be saved or, for
//! text files, previewed inline.

use std::collections::HashSet;
use std::path::PathBuf;

use crate::input::Action;
use crate::mail::{Attachment, GatewayError, Message, ThreadKey};

use super::event::Effect;
use super::state::{AppState, Mode};

/// Opened thread
#[derive(Debug, Clone, Default)]
pub struct ReaderState {
    pub key: Option<ThreadKey>,
    /// Newest first
    pub messages: Vec<Message>,
    pub loading: bool,
    /// Message under the cursor
    pub selected: usize,
    /// Ids of messages showing their body
    pub expanded: HashSet<String>,
    /// Lines scrolled past the selected message's header
    pub scroll: usize,
    pub attachments: Option<AttachmentsModal>,
    pub preview: Option<AttachmentPreview>,
}

impl ReaderState {
    pub fn selected_message(&self) -> Option<&Message> {
        self.messages.get(self.selected)
    }

    pub fn is_expanded(&self, message: &Message) -> bool {
        self.expanded.contains(&message.id)
    }

    fn select(&mut self, index: usize) {
        if self.messages.is_empty() {
            return;
        }
        self.selected = index.min(self.messages.len() - 1);
        self.scroll = 0;
    }

    fn toggle_expanded(&mut self) {
        let Some(id) = self.selected_message().map(|m| m.id.clone()) else {
            return;
        };
        if !self.expanded.remove(&id) {
            self.expanded.insert(id);
        }
    }
}

/// Attachment list of one message
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttachmentsModal {
    pub message_id: String,
    pub attachments: Vec<Attachment>,
    pub selected: usize,
    pub downloading: bool,
    pub loading_preview: bool,
}

impl AttachmentsModal {
    fn busy(&self) -> bool {
        self.downloading || self.loading_preview
    }

    fn current(&self) -> Option<&Attachment> {
        self.attachments.get(self.selected)
    }
}

/// Text attachment shown in place of the thread
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttachmentPreview {
    pub filename: String,
    pub mime_type: String,
    pub size: String,
    pub text: String,
    pub scroll: usize,
}

impl AppState {
    pub(crate) fn open_focused(&mut self) -> Vec<Effect> {
        let Some(key) = self.focused_key() else {
            return Vec::new();
        };
        self.mode = Mode::Reader;
        self.reader = ReaderState {
            key: Some(key.clone()),
            loading: true,
            ..Default::default()
        };
        let mut effects = vec![Effect::FetchThread(key.clone())];
        effects.extend(self.set_unread(&key, false));
        effects
    }

    pub(crate) fn close_reader(&mut self) {
        self.mode = Mode::Inbox;
        self.reader = ReaderState::default();
    }

    pub(crate) fn on_thread_loaded(
        &mut self,
        key: ThreadKey,
        result: Result<Vec<Message>, GatewayError>,
    ) -> Vec<Effect> {
        if self.reader.key.as_ref() != Some(&key) {
            tracing::debug!("Ignoring thread {} loaded after the reader moved on", key);
            return Vec::new();
        }
        self.reader.loading = false;
        match result {
            Ok(mut messages) => {
                messages.reverse();
                // Newest message starts expanded
                self.reader.expanded = messages.iter().take(1).map(|m| m.id.clone()).collect();
                self.reader.messages = messages;
                self.reader.selected = 0;
                self.reader.scroll = 0;
            }
            Err(e) => self.status.set_error(format!("Failed to load thread: {}", e)),
        }
        Vec::new()
    }

    pub(crate) fn handle_reader_action(&mut self, action: Action) -> Vec<Effect> {
        if self.reader.preview.is_some() {
            return self.handle_preview_action(action);
        }
        if self.reader.attachments.is_some() {
            return self.handle_attachments_action(action);
        }

        let page = self.viewport_rows.max(1);
        match action {
            Action::Back | Action::Cancel => {
                self.close_reader();
                return self.request_window();
            }
            Action::Up => self.reader.select(self.reader.selected.saturating_sub(1)),
            Action::Down => self.reader.select(self.reader.selected + 1),
            Action::Top => self.reader.select(0),
            Action::Bottom => self.reader.select(usize::MAX),
            Action::PageUp => self.reader.scroll = self.reader.scroll.saturating_sub(page),
            Action::PageDown => self.reader.scroll = self.reader.scroll.saturating_add(page),
            Action::ToggleExpand => self.reader.toggle_expanded(),
            Action::Attachments => self.open_attachments(),
            Action::Help => self.show_help = true,
            Action::ToggleRead => {
                if let Some(key) = self.reader.key.clone() {
                    return self.toggle_unread(&key);
                }
            }
            _ => {}
        }
        Vec::new()
    }

    fn open_attachments(&mut self) {
        let Some(message) = self.reader.selected_message() else {
            return;
        };
        if message.attachments.is_empty() {
            self.status.set_message("No attachments");
            return;
        }
        self.reader.attachments = Some(AttachmentsModal {
            message_id: message.id.clone(),
            attachments: message.attachments.clone(),
            ..Default::default()
        });
    }

    fn handle_attachments_action(&mut self, action: Action) -> Vec<Effect> {
        let Some(account_index) = self.reader.key.as_ref().map(|k| k.account_index) else {
            return Vec::new();
        };
        let Some(modal) = self.reader.attachments.as_mut() else {
            return Vec::new();
        };
        // Nothing else until the running transfer reports back
        if modal.downloading {
            return Vec::new();
        }

        match action {
            Action::Back | Action::Cancel | Action::Attachments => {
                self.reader.attachments = None;
            }
            Action::Up => modal.selected = modal.selected.saturating_sub(1),
            Action::Down => {
                modal.selected = (modal.selected + 1).min(modal.attachments.len().saturating_sub(1));
            }
            Action::Download if !modal.busy() => {
                if let Some(attachment) = modal.current().cloned() {
                    modal.downloading = true;
                    self.status.set_message(format!("Saving {}...", attachment.filename));
                    return vec![Effect::DownloadAttachment {
                        account_index,
                        message_id: modal.message_id.clone(),
                        attachment,
                    }];
                }
            }
            Action::Preview if !modal.busy() => {
                if let Some(attachment) = modal.current().cloned() {
                    if !attachment.is_text() {
                        self.status
                            .set_error(format!("Cannot preview {}", attachment.mime_type));
                        return Vec::new();
                    }
                    modal.loading_preview = true;
                    return vec![Effect::PreviewAttachment {
                        account_index,
                        message_id: modal.message_id.clone(),
                        attachment,
                    }];
                }
            }
            _ => {}
        }
        Vec::new()
    }

    fn handle_preview_action(&mut self, action: Action) -> Vec<Effect> {
        let page = self.viewport_rows.max(1);
        let Some(preview) = self.reader.preview.as_mut() else {
            return Vec::new();
        };
        match action {
            Action::Back | Action::Cancel => self.reader.preview = None,
            Action::Up => preview.scroll = preview.scroll.saturating_sub(1),
            Action::Down => preview.scroll = preview.scroll.saturating_add(1),
            Action::PageUp => preview.scroll = preview.scroll.saturating_sub(page),
            Action::PageDown => preview.scroll = preview.scroll.saturating_add(page),
            Action::Top => preview.scroll = 0,
            _ => {}
        }
        Vec::new()
    }

    pub(crate) fn on_attachment_saved(
        &mut self,
        filename: String,
        result: Result<PathBuf, String>,
    ) -> Vec<Effect> {
        self.reader.attachments = None;
        match result {
            Ok(path) => {
                tracing::info!("Saved attachment to {}", path.display());
                self.status.set_message(format!("Saved to {}", path.display()));
            }
            Err(e) => {
                self.status.set_message("");
                self.status
                    .set_error(format!("Failed to download {}: {}", filename, e));
            }
        }
        Vec::new()
    }

    pub(crate) fn on_attachment_loaded(
        &mut self,
        message_id: String,
        attachment: Attachment,
        result: Result<Vec<u8>, GatewayError>,
    ) -> Vec<Effect> {
        let waiting = self
            .reader
            .attachments
            .as_ref()
            .is_some_and(|m| m.message_id == message_id && m.loading_preview);
        if !waiting {
            tracing::debug!("Dropping preview of {} for a closed modal", attachment.filename);
            return Vec::new();
        }

        match result {
            Ok(data) => {
                self.reader.attachments = None;
                self.reader.preview = Some(AttachmentPreview {
                    size: attachment.display_size(),
                    text: String::from_utf8_lossy(&data).into_owned(),
                    filename: attachment.filename,
                    mime_type: attachment.mime_type,
                    scroll: 0,
                });
            }
            Err(e) => {
                if let Some(modal) = self.reader.attachments.as_mut() {
                    modal.loading_preview = false;
                }
                self.status
                    .set_error(format!("Failed to load {}: {}", attachment.filename, e));
            }
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::event::AppEvent;
    use crate::app::store::tests::loaded;

    fn key(id: &str) -> ThreadKey {
        ThreadKey::new(0, id)
    }

    fn text_file() -> Attachment {
        Attachment {
            filename: "notes.txt".to_string(),
            mime_type: "text/plain".to_string(),
            size: 5,
            attachment_id: "att-notes".to_string(),
        }
    }

    fn pdf_file() -> Attachment {
        Attachment {
            filename: "report.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            size: 4096,
            attachment_id: "att-pdf".to_string(),
        }
    }

    fn message(id: &str, attachments: Vec<Attachment>) -> Message {
        Message {
            id: id.to_string(),
            attachments,
            ..Default::default()
        }
    }

    /// Reader open on thread "a" with m1 (oldest, two files) and m2
    fn open_reader() -> AppState {
        let mut state = AppState::new(vec!["Personal".to_string()], 0);
        state.store.replace_threads(vec![loaded("a", 1)]);
        state.handle_action(Action::Open);
        state.apply(AppEvent::ThreadLoaded {
            key: key("a"),
            result: Ok(vec![
                message("m1", vec![text_file(), pdf_file()]),
                message("m2", Vec::new()),
            ]),
        });
        state
    }

    #[test]
    fn test_newest_message_starts_expanded() {
        let state = open_reader();
        assert_eq!(state.reader.messages[0].id, "m2");
        assert_eq!(state.reader.selected, 0);
        assert!(state.reader.is_expanded(&state.reader.messages[0]));
        assert!(!state.reader.is_expanded(&state.reader.messages[1]));
    }

    #[test]
    fn test_cursor_moves_between_messages_and_toggles_expand() {
        let mut state = open_reader();
        state.handle_action(Action::PageDown);
        assert!(state.reader.scroll > 0);

        state.handle_action(Action::Down);
        assert_eq!(state.reader.selected, 1);
        assert_eq!(state.reader.scroll, 0);
        state.handle_action(Action::Down);
        assert_eq!(state.reader.selected, 1);

        state.handle_action(Action::ToggleExpand);
        assert!(state.reader.expanded.contains("m1"));
        state.handle_action(Action::ToggleExpand);
        assert!(!state.reader.expanded.contains("m1"));

        state.handle_action(Action::Top);
        assert_eq!(state.reader.selected, 0);
    }

    #[test]
    fn test_attachments_need_a_message_with_files() {
        let mut state = open_reader();
        state.handle_action(Action::Attachments);
        assert!(state.reader.attachments.is_none());
        assert_eq!(state.status.message, "No attachments");

        state.handle_action(Action::Down);
        state.handle_action(Action::Attachments);
        let modal = state.reader.attachments.as_ref().unwrap();
        assert_eq!(modal.message_id, "m1");
        assert_eq!(modal.attachments.len(), 2);
    }

    #[test]
    fn test_download_runs_once_and_closes_modal() {
        let mut state = open_reader();
        state.handle_action(Action::Down);
        state.handle_action(Action::Attachments);
        state.handle_action(Action::Down);

        let effects = state.handle_action(Action::Download);
        assert_eq!(
            effects,
            vec![Effect::DownloadAttachment {
                account_index: 0,
                message_id: "m1".to_string(),
                attachment: pdf_file(),
            }]
        );
        // Locked while the transfer runs
        assert!(state.handle_action(Action::Download).is_empty());
        state.handle_action(Action::Back);
        assert!(state.reader.attachments.is_some());

        state.apply(AppEvent::AttachmentSaved {
            filename: "report.pdf".to_string(),
            result: Ok(PathBuf::from("/tmp/report.pdf")),
        });
        assert!(state.reader.attachments.is_none());
        assert_eq!(state.status.message, "Saved to /tmp/report.pdf");
    }

    #[test]
    fn test_failed_download_surfaces_error() {
        let mut state = open_reader();
        state.handle_action(Action::Down);
        state.handle_action(Action::Attachments);
        state.handle_action(Action::Download);

        state.apply(AppEvent::AttachmentSaved {
            filename: "notes.txt".to_string(),
            result: Err("disk full".to_string()),
        });
        assert!(state.reader.attachments.is_none());
        assert_eq!(
            state.status.error.as_deref(),
            Some("Failed to download notes.txt: disk full")
        );
    }

    #[test]
    fn test_text_preview_replaces_modal() {
        let mut state = open_reader();
        state.handle_action(Action::Down);
        state.handle_action(Action::Attachments);

        let effects = state.handle_action(Action::Preview);
        assert_eq!(effects.len(), 1);
        state.apply(AppEvent::AttachmentLoaded {
            message_id: "m1".to_string(),
            attachment: text_file(),
            result: Ok(b"hello".to_vec()),
        });

        assert!(state.reader.attachments.is_none());
        let preview = state.reader.preview.as_ref().unwrap();
        assert_eq!(preview.text, "hello");
        assert_eq!(preview.size, "5 B");

        // Back leaves the preview, then the reader
        state.handle_action(Action::Back);
        assert!(state.reader.preview.is_none());
        assert_eq!(state.mode, Mode::Reader);
        state.handle_action(Action::Back);
        assert_eq!(state.mode, Mode::Inbox);
    }

    #[test]
    fn test_binary_attachment_is_not_previewed() {
        let mut state = open_reader();
        state.handle_action(Action::Down);
        state.handle_action(Action::Attachments);
        state.handle_action(Action::Down);

        assert!(state.handle_action(Action::Preview).is_empty());
        assert!(state.status.error.as_deref().unwrap().contains("application/pdf"));
        assert!(!state.reader.attachments.as_ref().unwrap().loading_preview);
    }

    #[test]
    fn test_preview_for_closed_modal_is_dropped() {
        let mut state = open_reader();
        state.handle_action(Action::Down);
        state.handle_action(Action::Attachments);
        state.handle_action(Action::Preview);
        state.close_reader();

        state.apply(AppEvent::AttachmentLoaded {
            message_id: "m1".to_string(),
            attachment: text_file(),
            result: Ok(b"late".to_vec()),
        });
        assert!(state.reader.preview.is_none());
    }
}
