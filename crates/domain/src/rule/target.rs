//! Target: whose devices receive a rule's notification.

use serde::{Deserialize, Serialize};

use crate::id::UserId;

/// The user a rule notifies, addressed either by uid or by email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    Uid(UserId),
    Email(String),
}

impl Target {
    /// Pick the target from the optional document fields.
    ///
    /// The uid wins when both are set; blank strings count as absent.
    #[must_use]
    pub fn select(uid: Option<&str>, email: Option<&str>) -> Option<Self> {
        fn present(s: Option<&str>) -> Option<&str> {
            s.map(str::trim).filter(|s| !s.is_empty())
        }

        present(uid)
            .map(|uid| Self::Uid(UserId::new(uid)))
            .or_else(|| present(email).map(|email| Self::Email(email.to_string())))
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uid(uid) => write!(f, "uid:{uid}"),
            Self::Email(email) => write!(f, "email:{email}"),
        }
    }
}
