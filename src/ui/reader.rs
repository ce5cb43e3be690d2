use chrono::{DateTime, Local};
use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use super::theme::{Theme, symbols, with_selection_bg};
use super::widgets::{sanitize_text, truncate_to_width, wrap_to_width};
use crate::app::reader::AttachmentPreview;
use crate::app::snapshot::ReaderView;
use crate::mail::Message;

pub fn render_reader(frame: &mut Frame, area: Rect, reader: &ReaderView) {
    if let Some(preview) = &reader.preview {
        render_preview(frame, area, preview);
        return;
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Theme::text_muted())
        .title(Span::styled(
            format!(" {} ", sanitize_text(&reader.subject)),
            Theme::text_unread(),
        ));

    if reader.loading {
        let text = Paragraph::new(Span::styled(" Loading thread...", Theme::text_muted()))
            .block(block);
        frame.render_widget(text, area);
        return;
    }

    let width = area.width as usize;
    let mut lines: Vec<Line> = Vec::new();
    let mut anchor = 0;
    for (i, message) in reader.messages.iter().enumerate() {
        let selected = i == reader.selected;
        if selected {
            anchor = lines.len();
        }
        let expanded = reader.expanded.get(i).copied().unwrap_or(false);
        push_message(&mut lines, message, selected, expanded, width);
    }

    // Scrolling is relative to the selected message's header
    let top = (anchor + reader.scroll).min(lines.len().saturating_sub(1));
    let paragraph = Paragraph::new(lines)
        .block(block)
        .scroll((top.min(u16::MAX as usize) as u16, 0));
    frame.render_widget(paragraph, area);

    if let Some(modal) = &reader.attachments {
        super::popups::render_attachments(frame, area, modal);
    }
}

fn push_message(
    lines: &mut Vec<Line<'static>>,
    message: &Message,
    selected: bool,
    expanded: bool,
    width: usize,
) {
    let when = DateTime::from_timestamp_millis(message.timestamp)
        .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default();
    let marker = if expanded { "▾ " } else { "▸ " };
    let clip = if message.attachments.is_empty() {
        String::new()
    } else {
        format!("  {}{}", symbols::ATTACHMENT, message.attachments.len())
    };
    let header = Line::from(vec![
        Span::styled(marker, Theme::text_muted()),
        Span::styled(sanitize_text(&message.from), Theme::accent()),
        Span::styled(format!("  {}", when), Theme::text_muted()),
        Span::styled(clip, Theme::unread_indicator()),
    ]);
    lines.push(if selected {
        header.style(with_selection_bg(Theme::text()))
    } else {
        header
    });

    if !expanded {
        let snippet = truncate_to_width(&sanitize_text(&message.snippet), width.saturating_sub(2));
        lines.push(Line::from(Span::styled(
            format!("  {}", snippet),
            Theme::text_muted(),
        )));
        return;
    }

    if !message.to.is_empty() {
        lines.push(Line::from(Span::styled(
            format!("  To: {}", sanitize_text(&message.to)),
            Theme::text_muted(),
        )));
    }
    lines.push(Line::default());
    let body = if message.body_text.trim().is_empty() {
        &message.snippet
    } else {
        &message.body_text
    };
    for text in wrap_to_width(&sanitize_text(body), width) {
        lines.push(Line::from(Span::styled(text, Theme::text())));
    }
    if !message.attachments.is_empty() {
        lines.push(Line::default());
        for attachment in &message.attachments {
            lines.push(Line::from(vec![
                Span::styled(format!("  {} ", symbols::ATTACHMENT), Theme::unread_indicator()),
                Span::styled(sanitize_text(&attachment.filename), Theme::text()),
                Span::styled(
                    format!("  {}", attachment.display_size()),
                    Theme::text_muted(),
                ),
            ]));
        }
    }
    lines.push(Line::from(Span::styled(
        "─".repeat(width),
        Theme::text_muted(),
    )));
}

fn render_preview(frame: &mut Frame, area: Rect, preview: &AttachmentPreview) {
    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Theme::text_muted())
        .title(Line::from(vec![
            Span::styled(
                format!(" {} ", sanitize_text(&preview.filename)),
                Theme::text_unread(),
            ),
            Span::styled(
                format!("{} · {} ", preview.mime_type, preview.size),
                Theme::text_muted(),
            ),
        ]));

    let lines: Vec<Line> = wrap_to_width(&sanitize_text(&preview.text), area.width as usize)
        .into_iter()
        .map(|text| Line::from(Span::styled(text, Theme::text())))
        .collect();
    let top = preview.scroll.min(lines.len().saturating_sub(1));
    let paragraph = Paragraph::new(lines)
        .block(block)
        .scroll((top.min(u16::MAX as usize) as u16, 0));
    frame.render_widget(paragraph, area);
}
