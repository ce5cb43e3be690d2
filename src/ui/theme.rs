//! Colors and styles (Catppuccin Mocha)

use ratatui::style::{Color, Modifier, Style};

/// Catppuccin Mocha color palette
/// Official colors from https://github.com/catppuccin/catppuccin
mod catppuccin {
    use super::Color;

    pub const MANTLE: Color = Color::Rgb(24, 24, 37); // #181825 - status bar, panels
    pub const SURFACE1: Color = Color::Rgb(69, 71, 90); // #45475a - selection

    pub const TEXT: Color = Color::Rgb(205, 214, 244); // #cdd6f4 - primary
    pub const SUBTEXT1: Color = Color::Rgb(186, 194, 222); // #bac2de - secondary
    pub const OVERLAY0: Color = Color::Rgb(108, 112, 134); // #6c7086 - muted/disabled

    pub const BLUE: Color = Color::Rgb(137, 180, 250); // #89b4fa - links, accent
    pub const TEAL: Color = Color::Rgb(148, 226, 213); // #94e2d5 - account badges
    pub const YELLOW: Color = Color::Rgb(249, 226, 175); // #f9e2af - prompts
    pub const PEACH: Color = Color::Rgb(250, 179, 135); // #fab387 - selection marks
    pub const RED: Color = Color::Rgb(243, 139, 168); // #f38ba8 - errors
    pub const MAUVE: Color = Color::Rgb(203, 166, 247); // #cba6f7 - unread indicator
}

pub struct Theme;

impl Theme {
    pub fn status_bar() -> Style {
        Style::default()
            .bg(catppuccin::MANTLE)
            .fg(catppuccin::SUBTEXT1)
    }

    pub fn error_bar() -> Style {
        Style::default()
            .bg(catppuccin::RED)
            .fg(catppuccin::MANTLE)
            .add_modifier(Modifier::BOLD)
    }

    pub fn prompt() -> Style {
        Style::default()
            .fg(catppuccin::YELLOW)
            .add_modifier(Modifier::BOLD)
    }

    pub fn text() -> Style {
        Style::default().fg(catppuccin::TEXT)
    }

    pub fn text_muted() -> Style {
        Style::default().fg(catppuccin::OVERLAY0)
    }

    pub fn text_unread() -> Style {
        Style::default()
            .fg(catppuccin::TEXT)
            .add_modifier(Modifier::BOLD)
    }

    pub fn unread_indicator() -> Style {
        Style::default().fg(catppuccin::MAUVE)
    }

    pub fn account_badge() -> Style {
        Style::default().fg(catppuccin::TEAL)
    }

    pub fn selected_mark() -> Style {
        Style::default()
            .fg(catppuccin::PEACH)
            .add_modifier(Modifier::BOLD)
    }

    pub fn accent() -> Style {
        Style::default().fg(catppuccin::BLUE)
    }

    pub fn help_key() -> Style {
        Style::default()
            .fg(catppuccin::BLUE)
            .add_modifier(Modifier::BOLD)
    }

    pub fn help_desc() -> Style {
        Style::default().fg(catppuccin::SUBTEXT1)
    }
}

/// Background for the focused row, keeping the span's own foreground
pub fn with_selection_bg(style: Style) -> Style {
    style.bg(catppuccin::SURFACE1)
}

pub mod symbols {
    pub const UNREAD: &str = "●";
    pub const READ: &str = " ";
    pub const ATTACHMENT: &str = "+";
    pub const NO_ATTACHMENT: &str = " ";
    pub const SELECTED: &str = "✓";
    pub const NOT_SELECTED: &str = " ";
    pub const REMOTE_ONLY: &str = "~";
    pub const SPINNER: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
}
