//! Liveness port: where the heartbeat watchdog publishes its verdict.

use std::future::Future;

use alerthub_domain::error::HubError;

/// Sink for the device online flag.
pub trait LivenessStore {
    /// Publish whether the monitored device is online.
    fn publish(&self, online: bool) -> impl Future<Output = Result<(), HubError>> + Send;
}

impl<T: LivenessStore + Send + Sync> LivenessStore for std::sync::Arc<T> {
    fn publish(&self, online: bool) -> impl Future<Output = Result<(), HubError>> + Send {
        (**self).publish(online)
    }
}
