//! Push sender port: delivers one notification to one device.

use std::future::Future;

use alerthub_domain::error::HubError;
use alerthub_domain::rule::Notification;
use alerthub_domain::user::DeviceToken;

/// Push notification transport.
pub trait PushSender {
    /// Send `notification` to the device identified by `token`.
    fn send(
        &self,
        token: &DeviceToken,
        notification: &Notification,
    ) -> impl Future<Output = Result<(), HubError>> + Send;
}

impl<T: PushSender + Send + Sync> PushSender for std::sync::Arc<T> {
    fn send(
        &self,
        token: &DeviceToken,
        notification: &Notification,
    ) -> impl Future<Output = Result<(), HubError>> + Send {
        (**self).send(token, notification)
    }
}
