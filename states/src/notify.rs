//! User-facing notifications.
//!
//! Tables never print. They push [`Notification`]s through a [`Notifier`]
//! and the host drains the [`NotificationCenter`] whenever it is ready to
//! show them.

use std::fmt;

use log::{info, warn};

/// Seconds a notification stays visible unless told otherwise.
pub const DEFAULT_TIMEOUT_SECS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationLevel {
    Success,
    Info,
    Warning,
    Error,
}

impl fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub timeout_secs: u32,
}

impl Notification {
    pub fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Success, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, message)
    }

    pub fn with_timeout(mut self, timeout_secs: u32) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// Sending half handed to every table.
#[derive(Debug, Clone)]
pub struct Notifier {
    sender: flume::Sender<Notification>,
}

impl Notifier {
    pub fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Error | NotificationLevel::Warning => {
                warn!("[{}] {}", notification.level, notification.message);
            }
            NotificationLevel::Success | NotificationLevel::Info => {
                info!("[{}] {}", notification.level, notification.message);
            }
        }

        if self.sender.send(notification).is_err() {
            warn!("Notification dropped: the notification center is gone");
        }
    }
}

/// Receiving half owned by the host.
#[derive(Debug)]
pub struct NotificationCenter {
    sender: flume::Sender<Notification>,
    receiver: flume::Receiver<Notification>,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationCenter {
    pub fn new() -> Self {
        let (sender, receiver) = flume::unbounded();
        Self { sender, receiver }
    }

    pub fn notifier(&self) -> Notifier {
        Notifier {
            sender: self.sender.clone(),
        }
    }

    /// Takes every notification queued so far, oldest first.
    pub fn drain(&self) -> Vec<Notification> {
        self.receiver.try_iter().collect()
    }

    pub fn pending(&self) -> usize {
        self.receiver.len()
    }
}
