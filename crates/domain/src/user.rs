//! Users and their registered push devices.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::UserId;

/// Opaque push-transport device token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceToken(String);

impl DeviceToken {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceToken {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A user record as held by the user directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub uid: UserId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, alias = "fcmTokens")]
    pub tokens: Vec<DeviceToken>,
}

impl UserRecord {
    #[must_use]
    pub fn new(uid: impl Into<UserId>) -> Self {
        Self {
            uid: uid.into(),
            email: None,
            tokens: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.tokens.push(DeviceToken::new(token));
        self
    }

    /// Trimmed, non-empty tokens, deduplicated in first-seen order.
    #[must_use]
    pub fn usable_tokens(&self) -> Vec<DeviceToken> {
        let mut tokens: Vec<DeviceToken> = Vec::with_capacity(self.tokens.len());
        for token in &self.tokens {
            let trimmed = token.as_str().trim();
            if !trimmed.is_empty() && !tokens.iter().any(|t| t.as_str() == trimmed) {
                tokens.push(DeviceToken::new(trimmed));
            }
        }
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_skip_blank_and_duplicate_tokens() {
        let user = UserRecord::new("u1")
            .with_token("a")
            .with_token("  ")
            .with_token(" a ")
            .with_token("b");
        assert_eq!(
            user.usable_tokens(),
            vec![DeviceToken::new("a"), DeviceToken::new("b")]
        );
    }

    #[test]
    fn should_return_empty_when_user_has_no_tokens() {
        assert!(UserRecord::new("u1").usable_tokens().is_empty());
    }

    #[test]
    fn should_deserialize_with_defaults_and_alias() {
        let user: UserRecord =
            serde_json::from_str(r#"{"uid": "u1", "fcmTokens": ["t1"]}"#).unwrap();
        assert_eq!(user.uid, UserId::new("u1"));
        assert_eq!(user.email, None);
        assert_eq!(user.tokens, vec![DeviceToken::new("t1")]);
    }
}
