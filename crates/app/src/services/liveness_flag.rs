//! [`LivenessStore`] that writes the online flag into the realtime store.

use alerthub_domain::error::HubError;
use serde_json::Value;

use crate::ports::{LivenessStore, RealtimeStore};

/// Publishes liveness as a boolean at a fixed realtime-store path.
pub struct RealtimeLivenessFlag<RS> {
    store: RS,
    path: String,
}

impl<RS> RealtimeLivenessFlag<RS> {
    /// Create a flag writing to `path` in `store`.
    pub fn new(store: RS, path: impl Into<String>) -> Self {
        Self {
            store,
            path: path.into(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl<RS> LivenessStore for RealtimeLivenessFlag<RS>
where
    RS: RealtimeStore + Send + Sync,
{
    async fn publish(&self, online: bool) -> Result<(), HubError> {
        self.store.write(&self.path, Value::Bool(online)).await
    }
}
