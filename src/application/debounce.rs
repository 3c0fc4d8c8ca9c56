// src/application/debounce.rs
use std::time::{Duration, Instant};

/// Trailing-edge debounce timer.
///
/// Time is passed in by the caller so the same logic drives the interactive shell
/// (wall clock) and tests (synthetic instants). At most one deadline is pending;
/// re-arming replaces it.
#[derive(Debug, Clone)]
pub struct Debouncer {
    quiet: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            deadline: None,
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet
    }

    /// Cancel any pending deadline and start a new quiet period at `now`
    pub fn arm(&mut self, now: Instant) {
        self.deadline = Some(now + self.quiet);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Time left until the pending deadline, zero if already due
    pub fn due_in(&self, now: Instant) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// Consume the deadline if it has passed
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
