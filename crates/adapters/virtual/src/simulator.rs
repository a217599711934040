//! Virtual device bumping a heartbeat counter in the realtime store.

use std::sync::Arc;
use std::time::Duration;

use alerthub_app::ports::RealtimeStore;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Periodically increments the number stored at a path.
pub struct HeartbeatSimulator<RS> {
    store: Arc<RS>,
    path: String,
    interval: Duration,
}

impl<RS: RealtimeStore + Send + Sync + 'static> HeartbeatSimulator<RS> {
    #[must_use]
    pub fn new(store: Arc<RS>, path: impl Into<String>, interval: Duration) -> Self {
        Self {
            store,
            path: path.into(),
            interval,
        }
    }

    /// Spawn the simulator; the first bump happens immediately.
    #[must_use]
    pub fn start(self) -> SimulatorHandle {
        let first_bump = Instant::now();
        SimulatorHandle {
            task: tokio::spawn(self.run(first_bump)),
        }
    }

    async fn run(self, first_bump: Instant) {
        let mut ticker = tokio::time::interval_at(first_bump, self.interval);
        loop {
            ticker.tick().await;
            if let Err(err) = self.bump().await {
                tracing::warn!(%err, path = %self.path, "heartbeat simulator write failed");
            }
        }
    }

    async fn bump(&self) -> Result<(), alerthub_domain::error::HubError> {
        let current = self.store.read(&self.path).await?;
        let next = current.as_u64().unwrap_or(0).saturating_add(1);
        tracing::debug!(path = %self.path, next, "heartbeat bump");
        self.store.write(&self.path, Value::from(next)).await
    }
}

/// Handle on a running [`HeartbeatSimulator`].
pub struct SimulatorHandle {
    task: JoinHandle<()>,
}

impl SimulatorHandle {
    /// Abort the simulator task.
    pub async fn stop(self) {
        self.task.abort();
        let _ = self.task.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realtime::InMemoryRealtimeStore;
    use serde_json::json;

    async fn settle() {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn should_increment_counter_every_interval() {
        let store = Arc::new(InMemoryRealtimeStore::default());
        let handle =
            HeartbeatSimulator::new(Arc::clone(&store), "/heartbeat", Duration::from_secs(30))
                .start();
        settle().await;
        assert_eq!(store.get("/heartbeat"), json!(1));

        tokio::time::advance(Duration::from_secs(30)).await;
        settle().await;
        assert_eq!(store.get("/heartbeat"), json!(2));

        handle.stop().await;
        tokio::time::advance(Duration::from_secs(60)).await;
        settle().await;
        assert_eq!(store.get("/heartbeat"), json!(2));
    }

    #[tokio::test(start_paused = true)]
    async fn should_keep_schedule_from_start_when_time_advances_before_task_runs() {
        let store = Arc::new(InMemoryRealtimeStore::default());
        let handle =
            HeartbeatSimulator::new(Arc::clone(&store), "/heartbeat", Duration::from_secs(30))
                .start();

        tokio::time::advance(Duration::from_secs(30)).await;
        settle().await;

        assert_eq!(store.get("/heartbeat"), json!(2));
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn should_restart_from_zero_when_value_not_a_counter() {
        let store = Arc::new(InMemoryRealtimeStore::default());
        store.set("/heartbeat", json!("garbage"));
        let handle =
            HeartbeatSimulator::new(Arc::clone(&store), "/heartbeat", Duration::from_secs(30))
                .start();
        settle().await;

        assert_eq!(store.get("/heartbeat"), json!(1));
        handle.stop().await;
    }
}
