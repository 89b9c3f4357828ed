use std::time::{Duration, Instant};

/// Single-slot trailing-edge debouncer. Each trigger replaces any pending
/// deadline, so a burst of triggers inside the window collapses into one fire
/// once the window has been quiet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState {
    Idle,
    Pending { deadline: Instant },
}

#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    state: DebounceState,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            state: DebounceState::Idle,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, DebounceState::Pending { .. })
    }

    /// Arms (or re-arms) the deadline at `now + window`. A later trigger
    /// supersedes an earlier pending one.
    pub fn trigger(&mut self, now: Instant) {
        self.state = DebounceState::Pending {
            deadline: now + self.window,
        };
    }

    pub fn cancel(&mut self) {
        self.state = DebounceState::Idle;
    }

    /// Returns true exactly once per armed deadline, when `now` has reached it.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.state {
            DebounceState::Pending { deadline } if now >= deadline => {
                self.state = DebounceState::Idle;
                true
            }
            _ => false,
        }
    }
}
