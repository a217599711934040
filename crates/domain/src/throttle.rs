//! Minimum spacing between successive fires of one rule.

use std::time::{Duration, Instant};

/// Per-watcher fire throttle.
///
/// Owned by the watcher task that evaluates the rule, so a throttle never
/// outlives its watcher and is never shared between evaluations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throttle {
    min_spacing: Duration,
    last_fired: Option<Instant>,
}

impl Throttle {
    /// A throttle that has never fired.
    #[must_use]
    pub fn new(min_spacing: Duration) -> Self {
        Self {
            min_spacing,
            last_fired: None,
        }
    }

    #[must_use]
    pub fn min_spacing(&self) -> Duration {
        self.min_spacing
    }

    #[must_use]
    pub fn last_fired(&self) -> Option<Instant> {
        self.last_fired
    }

    /// Whether a fire observed at `now` is allowed.
    #[must_use]
    pub fn ready(&self, now: Instant) -> bool {
        self.last_fired
            .is_none_or(|last| now.saturating_duration_since(last) >= self.min_spacing)
    }

    /// Record a fire observed at `now`.
    pub fn record(&mut self, now: Instant) {
        self.last_fired = Some(now);
    }
}
