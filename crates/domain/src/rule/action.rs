//! Action: what a rule does when its condition fires.

use serde::{Deserialize, Serialize};

/// Push notification content sent to every resolved device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

impl Notification {
    #[must_use]
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

/// The effect executed when a rule fires.
///
/// Only push notifications are supported; documents carrying any other
/// action type are rejected at validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    Notification(Notification),
}

impl Action {
    /// Action type tag accepted in rule documents.
    pub const NOTIFICATION: &'static str = "notification";
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Notification(n) => write!(f, "notification({})", n.title),
        }
    }
}
