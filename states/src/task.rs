//! Handles for background work owned by a table.
//!
//! A table hands out its [`TaskHandle`]'s token to anything that runs on its
//! behalf (periodic refresh loops, in-flight queries). Disposing the table
//! cancels the token and that work winds down cooperatively.
//!
//! ```ignore
//! let handle = TaskHandle::new(TaskId::new("device".into(), 1), CancellationToken::new());
//! let token = handle.cancellation_token();
//! tokio::spawn(async move {
//!     tokio::select! {
//!         _ = token.cancelled() => {}
//!         _ = refresh_forever() => {}
//!     }
//! });
//! handle.cancel();
//! ```

use tokio_util::sync::CancellationToken;
use ustr::Ustr;

/// Identifies work by the table it belongs to and a generation counter.
///
/// Reopening a table id after disposal yields a higher generation, so work
/// started for the old instance can be told apart from the new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId {
    scope: Ustr,
    generation: u64,
}

impl TaskId {
    pub fn new(scope: Ustr, generation: u64) -> Self {
        Self { scope, generation }
    }

    /// The table id this work runs for.
    pub fn scope(&self) -> Ustr {
        self.scope
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Same scope, next generation.
    pub fn next(&self) -> Self {
        Self {
            scope: self.scope,
            generation: self.generation + 1,
        }
    }
}

/// A [`TaskId`] paired with the token that cancels its work.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    id: TaskId,
    cancel_token: CancellationToken,
}

impl TaskHandle {
    pub fn new(id: TaskId, cancel_token: CancellationToken) -> Self {
        Self { id, cancel_token }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    /// A clone of the token for work that must stop when this handle is cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Requests cooperative cancellation. Work stops at its next check.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}
