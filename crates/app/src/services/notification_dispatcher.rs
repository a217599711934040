//! Notification dispatcher: fans one notification out to many devices.

use alerthub_domain::rule::Notification;
use alerthub_domain::user::DeviceToken;

use crate::ports::PushSender;

/// Per-batch delivery counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub sent: usize,
    pub failed: usize,
}

/// Sends notifications through a [`PushSender`].
pub struct NotificationDispatcher<PS> {
    sender: PS,
}

impl<PS: PushSender> NotificationDispatcher<PS> {
    /// Create a new dispatcher backed by the given push transport.
    pub fn new(sender: PS) -> Self {
        Self { sender }
    }

    #[must_use]
    pub fn sender(&self) -> &PS {
        &self.sender
    }

    /// Send `notification` to every token, one after the other.
    ///
    /// A failed send is logged and counted; the remaining tokens are still
    /// attempted and nothing is retried.
    #[tracing::instrument(skip_all, fields(tokens = tokens.len(), title = %notification.title))]
    pub async fn dispatch(
        &self,
        tokens: &[DeviceToken],
        notification: &Notification,
    ) -> DispatchReport {
        let mut report = DispatchReport::default();
        for token in tokens {
            match self.sender.send(token, notification).await {
                Ok(()) => report.sent += 1,
                Err(err) => {
                    tracing::warn!(%err, %token, "push send failed");
                    report.failed += 1;
                }
            }
        }
        report
    }
}
