//! Semantic color palette for terminal output.

use owo_colors::{OwoColorize, Style};

/// Allowed decisions and completed commands (green bold).
pub fn success_style() -> Style {
    Style::new().green().bold()
}

/// Denials and failures (red bold).
pub fn error_style() -> Style {
    Style::new().red().bold()
}

/// Secondary text such as labels and hints (dimmed).
pub fn muted_style() -> Style {
    Style::new().dimmed()
}

/// Trait extension to apply semantic styles.
pub trait SemanticStyle {
    fn success(&self) -> String;
    fn error(&self) -> String;
    fn muted(&self) -> String;
}

fn paint(value: &impl std::fmt::Display, style: Style) -> String {
    if super::no_color() {
        value.to_string()
    } else {
        value.style(style).to_string()
    }
}

impl<T: std::fmt::Display> SemanticStyle for T {
    fn success(&self) -> String {
        paint(self, success_style())
    }

    fn error(&self) -> String {
        paint(self, error_style())
    }

    fn muted(&self) -> String {
        paint(self, muted_style())
    }
}
