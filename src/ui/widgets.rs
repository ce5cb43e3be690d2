//! Common UI widgets and utilities

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::theme::Theme;

/// Simple status bar with left and right text
pub fn status_bar(frame: &mut Frame, area: Rect, left: &str, right: &str) {
    let style = Theme::status_bar();

    let available = (area.width as usize).saturating_sub(left.width() + right.width() + 4);
    let line = Line::from(vec![
        Span::styled(format!(" {} ", left), style),
        Span::styled(" ".repeat(available), style),
        Span::styled(format!(" {} ", right), style),
    ]);

    frame.render_widget(Paragraph::new(line).style(style), area);
}

pub fn error_bar(frame: &mut Frame, area: Rect, message: &str) {
    let paragraph = Paragraph::new(format!(" Error: {} ", message)).style(Theme::error_bar());
    frame.render_widget(paragraph, area);
}

pub fn help_bar(frame: &mut Frame, area: Rect, hints: &[(&str, &str)]) {
    let available_width = area.width as usize;

    let mut spans: Vec<Span> = Vec::new();
    let mut used = 0;
    for (i, (key, desc)) in hints.iter().enumerate() {
        // " key desc │ "
        let width = key.width() + desc.width() + if i + 1 < hints.len() { 5 } else { 3 };
        if used + width > available_width && i > 0 {
            break;
        }
        if i > 0 {
            spans.push(Span::styled(" │", Theme::text_muted()));
        }
        spans.push(Span::styled(format!(" {} ", key), Theme::help_key()));
        spans.push(Span::styled(desc.to_string(), Theme::help_desc()));
        used += width;
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Truncate to a display width, marking the cut with "..."
pub fn truncate_to_width(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    if max_width <= 3 {
        return take_width(s, max_width);
    }
    format!("{}...", take_width(s, max_width - 3))
}

/// Pad or truncate to exactly `width` columns
pub fn fit_width(s: &str, width: usize) -> String {
    let truncated = truncate_to_width(s, width);
    let pad = width.saturating_sub(truncated.width());
    format!("{}{}", truncated, " ".repeat(pad))
}

fn take_width(s: &str, max_width: usize) -> String {
    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > max_width {
            break;
        }
        used += w;
        out.push(c);
    }
    out
}

/// Break text into lines no wider than `width`, preferring spaces
pub fn wrap_to_width(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut out = Vec::new();
    for source in text.lines() {
        let source = source.replace('\t', "    ");
        let mut line = String::new();
        let mut used = 0;
        for word in source.split_inclusive(' ') {
            let w = word.width();
            if used + w > width && used > 0 {
                out.push(std::mem::take(&mut line).trim_end().to_string());
                used = 0;
            }
            if w > width {
                // Hard-split words longer than a whole line
                for c in word.chars() {
                    let cw = c.width().unwrap_or(0);
                    if used + cw > width && used > 0 {
                        out.push(std::mem::take(&mut line));
                        used = 0;
                    }
                    line.push(c);
                    used += cw;
                }
            } else {
                line.push_str(word);
                used += w;
            }
        }
        out.push(line.trim_end().to_string());
    }
    out
}

/// Centered rect clamped to the area, leaving a two-cell margin when possible
pub fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let w = width.min(area.width.saturating_sub(4)).max(area.width.min(20));
    let h = height.min(area.height.saturating_sub(2)).max(area.height.min(3));
    let x = area.x + area.width.saturating_sub(w) / 2;
    let y = area.y + area.height.saturating_sub(h) / 2;
    Rect::new(x, y, w, h)
}

/// Sanitize text for display: remove control characters and ANSI escape sequences
pub fn sanitize_text(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            // Skip until the terminating letter
            while let Some(ch) = chars.next() {
                if ch.is_ascii_alphabetic() {
                    break;
                }
            }
            continue;
        }
        if c.is_control() && c != '\n' && c != '\t' {
            result.push(' ');
        } else {
            result.push(c);
        }
    }

    result
}
