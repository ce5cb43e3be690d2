use aho_corasick::AhoCorasick;
use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
};
use unicode_width::UnicodeWidthStr;

use super::theme::{Theme, symbols, with_selection_bg};
use super::widgets::{fit_width, sanitize_text, status_bar, truncate_to_width};
use crate::app::snapshot::{RowView, Snapshot};

const ACCOUNT_WIDTH: usize = 10;
const SENDER_WIDTH: usize = 20;
const TIME_WIDTH: usize = 10;

/// Lowercase `text`, recording for every byte of the result the byte range
/// of the source character it came from. Lowercasing can change a
/// character's length, so match offsets must be mapped back through this.
fn lowercase_with_origin(text: &str) -> (String, Vec<(usize, usize)>) {
    let mut lower = String::with_capacity(text.len());
    let mut origin = Vec::with_capacity(text.len());
    for (idx, c) in text.char_indices() {
        let source = (idx, idx + c.len_utf8());
        for lc in c.to_lowercase() {
            lower.push(lc);
            origin.extend(std::iter::repeat_n(source, lc.len_utf8()));
        }
    }
    (lower, origin)
}

/// Highlight query matches in text, returning multiple styled spans.
/// Uses aho-corasick for case-insensitive matching of each query term.
fn highlight_matches(
    text: &str,
    query: &str,
    base_style: Style,
    highlight_style: Style,
) -> Vec<Span<'static>> {
    let terms: Vec<String> = query
        .split_whitespace()
        .filter(|t| !t.contains(':'))
        .map(str::to_lowercase)
        .collect();
    if terms.is_empty() {
        return vec![Span::styled(text.to_string(), base_style)];
    }

    let ac = match AhoCorasick::new(&terms) {
        Ok(ac) => ac,
        Err(_) => return vec![Span::styled(text.to_string(), base_style)],
    };

    let (text_lower, origin) = lowercase_with_origin(text);
    let mut spans = Vec::new();
    let mut last_end = 0;
    for mat in ac.find_iter(&text_lower) {
        // Widen to whole source characters
        let start = origin[mat.start()].0.max(last_end);
        let end = origin[mat.end() - 1].1;
        if start >= end {
            continue;
        }
        if start > last_end {
            spans.push(Span::styled(text[last_end..start].to_string(), base_style));
        }
        spans.push(Span::styled(text[start..end].to_string(), highlight_style));
        last_end = end;
    }
    if last_end < text.len() {
        spans.push(Span::styled(text[last_end..].to_string(), base_style));
    }
    spans
}

fn spinner() -> &'static str {
    let millis = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    symbols::SPINNER[(millis / 80) as usize % symbols::SPINNER.len()]
}

pub fn render_status(frame: &mut Frame, area: Rect, snap: &Snapshot) {
    let mut left = format!("Inbox  {}/{}", snap.display_count, snap.total);
    if snap.selected > 0 {
        left.push_str(&format!("  {} selected", snap.selected));
    }

    let mut right = Vec::new();
    if snap.inbox.loading {
        right.push(format!("{} loading", spinner()));
    } else if snap.inbox.refreshing {
        right.push(format!("{} refreshing", spinner()));
    } else if snap.inbox.loading_more {
        right.push(format!("{} more", spinner()));
    }
    if snap.hydrating > 0 {
        right.push(format!("{} threads pending", snap.hydrating));
    }
    if snap.search.remote_loading {
        right.push(format!("{} searching", spinner()));
    }
    if snap.has_unacknowledged_error && snap.error.is_none() {
        right.push("!".to_string());
    }

    status_bar(frame, area, &left, &right.join("  "));
}

/// Search prompt, confirmation prompt, or the last status message
pub fn render_info_line(frame: &mut Frame, area: Rect, snap: &Snapshot) {
    let line = if let Some(prompt) = &snap.prompt {
        Line::from(Span::styled(format!(" {}", prompt), Theme::prompt()))
    } else if let Some(input) = &snap.search.editing {
        Line::from(vec![
            Span::styled(" / ", Theme::accent()),
            Span::styled(input.clone(), Theme::text()),
            Span::styled("█", Theme::text_muted()),
        ])
    } else if !snap.search.query.is_empty() {
        Line::from(vec![
            Span::styled(" Search: ", Theme::accent()),
            Span::styled(snap.search.query.clone(), Theme::text()),
            Span::styled("  (Esc to clear)", Theme::text_muted()),
        ])
    } else if let Some(undo) = &snap.undo
        && snap.message.is_empty()
    {
        Line::from(Span::styled(
            format!(" {} (u to undo)", undo),
            Theme::text_muted(),
        ))
    } else {
        Line::from(Span::styled(format!(" {}", snap.message), Theme::text_muted()))
    };
    frame.render_widget(Paragraph::new(line), area);
}

pub fn render_list(frame: &mut Frame, area: Rect, snap: &Snapshot) {
    if snap.rows.is_empty() {
        let text = if snap.inbox.loading {
            "Loading..."
        } else if !snap.search.query.is_empty() {
            "No matching threads"
        } else {
            "Inbox is empty"
        };
        frame.render_widget(
            Paragraph::new(Span::styled(format!(" {}", text), Theme::text_muted())),
            area,
        );
        return;
    }

    let width = area.width as usize;
    let lines: Vec<Line> = snap
        .rows
        .iter()
        .take(area.height as usize)
        .map(|row| render_row(row, width, &snap.search.query))
        .collect();
    frame.render_widget(Paragraph::new(lines), area);
}

fn render_row(row: &RowView, width: usize, query: &str) -> Line<'static> {
    let style = |s: Style| if row.focused { with_selection_bg(s) } else { s };
    let text_style = if row.unread {
        Theme::text_unread()
    } else {
        Theme::text()
    };

    let marks = vec![
        Span::styled(
            if row.selected {
                symbols::SELECTED
            } else {
                symbols::NOT_SELECTED
            },
            style(Theme::selected_mark()),
        ),
        Span::styled(
            if row.unread {
                symbols::UNREAD
            } else {
                symbols::READ
            },
            style(Theme::unread_indicator()),
        ),
        Span::styled(
            if row.has_attachment {
                symbols::ATTACHMENT
            } else if row.search_only {
                symbols::REMOTE_ONLY
            } else {
                symbols::NO_ATTACHMENT
            },
            style(Theme::text_muted()),
        ),
        Span::styled(" ", style(Theme::text())),
    ];

    let account = fit_width(&row.account_name, ACCOUNT_WIDTH);
    let sender = if row.loaded {
        let count = if row.message_count > 1 {
            format!(" ({})", row.message_count)
        } else {
            String::new()
        };
        fit_width(&format!("{}{}", sanitize_text(&row.sender), count), SENDER_WIDTH)
    } else {
        fit_width("", SENDER_WIDTH)
    };
    let time = format!("{:>w$}", row.time, w = TIME_WIDTH);

    let fixed = 4 + ACCOUNT_WIDTH + 1 + SENDER_WIDTH + 1 + TIME_WIDTH;
    let body_width = width.saturating_sub(fixed);
    let body = if row.loaded {
        let subject = sanitize_text(&row.subject);
        let snippet = sanitize_text(&row.snippet);
        if snippet.is_empty() {
            subject
        } else {
            format!("{} - {}", subject, snippet)
        }
    } else {
        "Loading...".to_string()
    };
    let body = fit_width(&truncate_to_width(&body, body_width), body_width);

    let mut spans = marks;
    spans.push(Span::styled(account, style(Theme::account_badge())));
    spans.push(Span::styled(" ", style(Theme::text())));
    spans.push(Span::styled(sender, style(text_style)));
    spans.push(Span::styled(" ", style(Theme::text())));
    if row.loaded {
        spans.extend(highlight_matches(
            &body,
            query,
            style(text_style),
            style(Theme::prompt()),
        ));
    } else {
        spans.push(Span::styled(body, style(Theme::text_muted())));
    }
    spans.push(Span::styled(time, style(Theme::text_muted())));

    let used: usize = spans.iter().map(|s| s.content.width()).sum();
    if used < width {
        spans.push(Span::styled(" ".repeat(width - used), style(Theme::text())));
    }
    Line::from(spans)
}
