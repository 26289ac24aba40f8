//! Clipboard text access for table copy actions.
//!
//! - [`ClipboardProvider`]: what the front end writes search links and
//!   copied selections through
//! - [`SystemClipboard`]: the platform clipboard via `arboard` (native only)
//! - [`MemoryClipboard`]: an in-process clipboard for tests and headless runs
//!
//! ```rust,no_run
//! use netdeck_clipboard::{ClipboardProvider, SystemClipboard};
//!
//! let clipboard = SystemClipboard;
//! clipboard.set_text("r1,r2").expect("clipboard should be writable");
//! ```

use std::sync::{Mutex, PoisonError};

use log::debug;

#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    #[error("Clipboard access error: {0}")]
    Access(String),
    #[error("Clipboard holds no text")]
    NoText,
    #[error("Clipboard is not available on this platform")]
    Unsupported,
}

pub trait ClipboardProvider {
    fn set_text(&self, text: &str) -> Result<(), ClipboardError>;

    /// `Ok(None)` when the clipboard is readable but holds no text.
    fn get_text(&self) -> Result<Option<String>, ClipboardError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

#[cfg(not(target_arch = "wasm32"))]
impl ClipboardProvider for SystemClipboard {
    fn set_text(&self, text: &str) -> Result<(), ClipboardError> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| ClipboardError::Access(e.to_string()))?;
        clipboard
            .set_text(text)
            .map_err(|e| ClipboardError::Access(e.to_string()))?;
        debug!("Copied {} byte(s) to the system clipboard", text.len());
        Ok(())
    }

    fn get_text(&self) -> Result<Option<String>, ClipboardError> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| ClipboardError::Access(e.to_string()))?;
        match clipboard.get_text() {
            Ok(text) => Ok(Some(text)),
            Err(arboard::Error::ContentNotAvailable) => Ok(None),
            Err(e) => Err(ClipboardError::Access(e.to_string())),
        }
    }
}

#[cfg(target_arch = "wasm32")]
impl ClipboardProvider for SystemClipboard {
    fn set_text(&self, _text: &str) -> Result<(), ClipboardError> {
        Err(ClipboardError::Unsupported)
    }

    fn get_text(&self) -> Result<Option<String>, ClipboardError> {
        Err(ClipboardError::Unsupported)
    }
}

#[derive(Debug, Default)]
pub struct MemoryClipboard {
    text: Mutex<Option<String>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClipboardProvider for MemoryClipboard {
    fn set_text(&self, text: &str) -> Result<(), ClipboardError> {
        *self.text.lock().unwrap_or_else(PoisonError::into_inner) = Some(text.to_owned());
        Ok(())
    }

    fn get_text(&self) -> Result<Option<String>, ClipboardError> {
        Ok(self
            .text
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }
}

/// Copies `text`, or fails with [`ClipboardError::NoText`] for empty input.
pub fn copy_text(provider: &dyn ClipboardProvider, text: &str) -> Result<(), ClipboardError> {
    if text.is_empty() {
        return Err(ClipboardError::NoText);
    }
    provider.set_text(text)
}
