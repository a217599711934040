//! Heartbeat liveness detection.
//!
//! A remote device periodically bumps a counter in the realtime store. The
//! device is considered online while the counter keeps changing between two
//! checks, and offline once it stops moving or can no longer be read.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::rule::compare::same_value;

/// Last known liveness of the monitored device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Liveness {
    #[default]
    Unknown,
    Online,
    Offline,
}

impl Liveness {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Online => "online",
            Self::Offline => "offline",
        }
    }
}

impl From<bool> for Liveness {
    fn from(online: bool) -> Self {
        if online { Self::Online } else { Self::Offline }
    }
}

impl fmt::Display for Liveness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Change-detection state machine behind the watchdog.
#[derive(Debug, Clone, PartialEq)]
pub struct HeartbeatState {
    baseline: Option<Value>,
    first_check: bool,
    liveness: Liveness,
}

impl Default for HeartbeatState {
    fn default() -> Self {
        Self::new()
    }
}

impl HeartbeatState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            baseline: None,
            first_check: true,
            liveness: Liveness::Unknown,
        }
    }

    #[must_use]
    pub fn liveness(&self) -> Liveness {
        self.liveness
    }

    #[must_use]
    pub fn baseline(&self) -> Option<&Value> {
        self.baseline.as_ref()
    }

    #[must_use]
    pub fn is_first_check(&self) -> bool {
        self.first_check
    }

    /// Feed one successful read and return the flag to publish, if any.
    ///
    /// The first check only establishes the baseline: a present value
    /// reports online, a `null` one publishes nothing. Later checks report
    /// offline when the value equals the previous one and online otherwise.
    pub fn observe(&mut self, value: Value) -> Option<bool> {
        let online = if self.first_check {
            self.first_check = false;
            (!value.is_null()).then_some(true)
        } else {
            let unchanged = self
                .baseline
                .as_ref()
                .is_some_and(|previous| same_value(previous, &value));
            Some(!unchanged)
        };
        self.baseline = Some(value);
        if let Some(online) = online {
            self.liveness = online.into();
        }
        online
    }

    /// Record a failed read. Always reports offline and keeps the baseline.
    pub fn read_failed(&mut self) -> bool {
        self.liveness = Liveness::Offline;
        false
    }
}
