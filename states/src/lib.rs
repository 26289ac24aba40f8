//! Client-side state shared by every table: persisted preferences, the
//! user-facing notification channel, search debouncing and cancellable
//! background work.

mod debounce;
mod error;
mod notify;
mod storage;
mod task;

pub use debounce::Debouncer;
pub use error::StorageError;
pub use notify::{Notification, NotificationCenter, NotificationLevel, Notifier};
pub use storage::{ClientStorage, FileStorage, MemoryStorage};
pub use task::{TaskHandle, TaskId};
