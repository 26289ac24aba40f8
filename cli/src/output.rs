//! Styled terminal output.

use std::fmt::Display;

use console::{Term, style};

use netdeck_states::{Notification, NotificationLevel};

/// Terminal output helper for consistent styled output.
pub struct Output {
    term: Term,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    pub fn new() -> Self {
        Self {
            term: Term::stdout(),
        }
    }

    fn line(&self, text: &str) {
        drop(self.term.write_line(text));
    }

    pub fn success(&self, message: impl Display) {
        self.line(&format!("{} {message}", style("✓").green().bold()));
    }

    pub fn error(&self, message: impl Display) {
        self.line(&format!("{} {message}", style("✗").red().bold()));
    }

    pub fn warning(&self, message: impl Display) {
        self.line(&format!("{} {message}", style("⚠").yellow().bold()));
    }

    pub fn info(&self, message: impl Display) {
        self.line(&format!("{} {message}", style("ℹ").blue().bold()));
    }

    /// A toast from the table engine, styled by its level.
    pub fn notification(&self, notification: &Notification) {
        match notification.level {
            NotificationLevel::Success => self.success(&notification.message),
            NotificationLevel::Info => self.info(&notification.message),
            NotificationLevel::Warning => self.warning(&notification.message),
            NotificationLevel::Error => self.error(&notification.message),
        }
    }

    pub fn print(&self, message: impl Display) {
        self.line(&message.to_string());
    }

    pub fn header(&self, message: impl Display) {
        self.line(&style(message).bold().cyan().to_string());
    }

    pub fn dim(&self, message: impl Display) {
        self.line(&style(message).dim().to_string());
    }

    pub fn labeled(&self, label: impl Display, value: impl Display) {
        self.line(&format!("{}: {value}", style(label).dim()));
    }

    /// Clears the screen between `watch` refreshes.
    pub fn clear(&self) {
        drop(self.term.clear_screen());
    }
}
