//! Quiet-period debouncing driven by an injected clock.

use chrono::{DateTime, Duration, Utc};

/// Fires once after `quiet` has elapsed since the last trigger.
///
/// Time is passed in explicitly, so hosts decide how to wait and tests
/// never sleep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Debouncer {
    quiet: Duration,
    deadline: Option<DateTime<Utc>>,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            deadline: None,
        }
    }

    pub fn quiet(&self) -> Duration {
        self.quiet
    }

    /// Restarts the quiet period at `now`, returning the new deadline.
    pub fn trigger(&mut self, now: DateTime<Utc>) -> DateTime<Utc> {
        let deadline = now + self.quiet;
        self.deadline = Some(deadline);
        deadline
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Disarms and returns `true` when the deadline has passed.
    pub fn fire(&mut self, now: DateTime<Utc>) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}
