//! Overlays drawn on top of the list or reader

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};
use unicode_width::UnicodeWidthStr;

use super::theme::{Theme, symbols, with_selection_bg};
use super::widgets::{centered_rect, fit_width, sanitize_text};
use crate::app::reader::AttachmentsModal;

pub fn render_attachments(frame: &mut Frame, area: Rect, modal: &AttachmentsModal) {
    let height = modal.attachments.len() as u16 + 2;
    let popup = centered_rect(area, 60, height);
    frame.render_widget(Clear, popup);

    let footer = if modal.downloading {
        " Saving... "
    } else if modal.loading_preview {
        " Loading preview... "
    } else {
        " Enter/d save │ v view │ Esc close "
    };
    let block = Block::default()
        .title(Span::styled(" Attachments ", Theme::accent()))
        .title_bottom(Span::styled(footer, Theme::text_muted()))
        .borders(Borders::ALL)
        .border_style(Theme::accent());
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let width = inner.width as usize;
    // Keep the cursor inside the visible rows
    let first = modal
        .selected
        .saturating_sub((inner.height as usize).saturating_sub(1));
    let lines: Vec<Line> = modal
        .attachments
        .iter()
        .enumerate()
        .skip(first)
        .map(|(i, attachment)| {
            let size = format!(" {} ", attachment.display_size());
            let name_width = width.saturating_sub(size.width() + 2);
            let name = fit_width(&sanitize_text(&attachment.filename), name_width);
            let style = if i == modal.selected {
                with_selection_bg(Theme::text())
            } else {
                Theme::text()
            };
            Line::from(vec![
                Span::styled(format!("{} ", symbols::ATTACHMENT), Theme::unread_indicator()),
                Span::styled(name, style),
                Span::styled(size, Theme::text_muted()),
            ])
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);
}

pub fn render_help(frame: &mut Frame, area: Rect, title: &str, hints: &[(&str, &str)]) {
    let key_width = hints.iter().map(|(k, _)| k.width()).max().unwrap_or(0) + 2;
    let width = hints
        .iter()
        .map(|(_, d)| key_width + d.width())
        .max()
        .unwrap_or(0)
        .max(title.width() + 2) as u16
        + 4;
    let popup = centered_rect(area, width.max(30), hints.len() as u16 + 2);
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .title(Span::styled(format!(" {} ", title), Theme::accent()))
        .title_bottom(Span::styled(" any key to close ", Theme::text_muted()))
        .borders(Borders::ALL)
        .border_style(Theme::accent());
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let lines: Vec<Line> = hints
        .iter()
        .map(|(key, desc)| {
            Line::from(vec![
                Span::styled(format!(" {}", fit_width(key, key_width)), Theme::help_key()),
                Span::styled(desc.to_string(), Theme::help_desc()),
            ])
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);
}
