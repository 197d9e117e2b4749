//! Terminal styling as a swappable strategy.
//!
//! Formatting code asks a [`Paint`] to style a piece of text for a [`Role`];
//! whether that produces ANSI escapes or plain text is decided once, up front.

use crossterm::style::Stylize;
use crossterm::tty::IsTty;
use serde::{Deserialize, Serialize};

/// What a piece of text is, which determines its color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Distance from the branch tip.
    Offset,
    Hash,
    /// Code-review cross reference.
    Revision,
    Author,
}

pub trait Paint {
    /// Style `text` for `role`. Empty text stays empty.
    fn paint(&self, role: Role, text: &str) -> String;
}

/// ANSI colors via crossterm.
pub struct Ansi;

impl Paint for Ansi {
    fn paint(&self, role: Role, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }
        match role {
            Role::Offset => text.green().to_string(),
            Role::Hash | Role::Revision => text.magenta().to_string(),
            Role::Author => text.red().to_string(),
        }
    }
}

/// No styling at all.
pub struct Plain;

impl Paint for Plain {
    fn paint(&self, _role: Role, text: &str) -> String {
        text.to_string()
    }
}

/// When to emit colors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Color when stdout is a terminal.
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    pub fn painter(self) -> Box<dyn Paint> {
        let colored = match self {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => std::io::stdout().is_tty(),
        };
        if colored { Box::new(Ansi) } else { Box::new(Plain) }
    }
}
