//! Push sender that logs notifications instead of delivering them.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use alerthub_app::ports::PushSender;
use alerthub_domain::error::HubError;
use alerthub_domain::rule::Notification;
use alerthub_domain::time::{Timestamp, now};
use alerthub_domain::user::DeviceToken;

use crate::error::VirtualError;

/// A notification accepted by [`LoggingPushSender`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotification {
    pub token: DeviceToken,
    pub notification: Notification,
    pub sent_at: Timestamp,
}

/// [`PushSender`] that records every notification in an outbox.
#[derive(Default)]
pub struct LoggingPushSender {
    outbox: Mutex<Vec<SentNotification>>,
    rejected: HashSet<String>,
}

impl LoggingPushSender {
    /// Fail every send addressed to one of `tokens`.
    #[must_use]
    pub fn rejecting(mut self, tokens: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.rejected.extend(tokens.into_iter().map(Into::into));
        self
    }

    fn outbox(&self) -> MutexGuard<'_, Vec<SentNotification>> {
        self.outbox.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every notification sent so far, oldest first.
    #[must_use]
    pub fn sent(&self) -> Vec<SentNotification> {
        self.outbox().clone()
    }

    #[must_use]
    pub fn sent_count(&self) -> usize {
        self.outbox().len()
    }
}

impl PushSender for LoggingPushSender {
    async fn send(&self, token: &DeviceToken, notification: &Notification) -> Result<(), HubError> {
        if self.rejected.contains(token.as_str()) {
            return Err(VirtualError::TokenRejected(token.to_string()).into());
        }
        tracing::info!(
            %token,
            title = %notification.title,
            body = %notification.body,
            "push notification"
        );
        self.outbox().push(SentNotification {
            token: token.clone(),
            notification: notification.clone(),
            sent_at: now(),
        });
        Ok(())
    }
}
