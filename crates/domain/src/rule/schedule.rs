//! Schedule: optional polling period attached to a rule.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

/// Unit of a schedule interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    Seconds,
    Minutes,
    Hours,
}

impl TimeUnit {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "seconds" => Some(Self::Seconds),
            "minutes" => Some(Self::Minutes),
            "hours" => Some(Self::Hours),
            _ => None,
        }
    }

    /// Unit name as written in rule documents.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Seconds => "seconds",
            Self::Minutes => "minutes",
            Self::Hours => "hours",
        }
    }

    fn seconds(self) -> f64 {
        match self {
            Self::Seconds => 1.0,
            Self::Minutes => 60.0,
            Self::Hours => 3600.0,
        }
    }
}

/// A validated polling schedule: every `interval` `unit`s.
///
/// Only constructed through [`Schedule::new`] or [`Schedule::from_parts`],
/// which guarantee a finite, strictly positive period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Schedule {
    unit: TimeUnit,
    interval: f64,
}

impl Schedule {
    /// Build a schedule; returns `None` unless `interval` is finite and positive.
    #[must_use]
    pub fn new(unit: TimeUnit, interval: f64) -> Option<Self> {
        let schedule = Self { unit, interval };
        (interval.is_finite() && interval > 0.0 && !schedule.period().is_zero()).then_some(schedule)
    }

    /// Normalize loosely-typed schedule fields from a rule document.
    ///
    /// Anything other than a known unit name with a positive JSON number
    /// yields `None`, meaning the rule is event-driven.
    #[must_use]
    pub fn from_parts(unit: Option<&str>, interval: Option<&serde_json::Value>) -> Option<Self> {
        let unit = TimeUnit::parse(unit?)?;
        let interval = interval?.as_f64()?;
        Self::new(unit, interval)
    }

    #[must_use]
    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    #[must_use]
    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// Polling period, rounded to whole milliseconds.
    #[must_use]
    pub fn period(&self) -> Duration {
        let secs = self.interval * self.unit.seconds();
        Duration::try_from_secs_f64(secs).map_or(Duration::ZERO, |d| {
            Duration::from_millis(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        })
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "every {} {}", self.interval, self.unit.as_str())
    }
}
