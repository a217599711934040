//! Heartbeat watchdog: periodically infers device liveness.

use std::sync::Arc;
use std::time::Duration;

use alerthub_domain::heartbeat::{HeartbeatState, Liveness};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::ports::{LivenessStore, RealtimeStore};

/// Default path of the heartbeat counter.
pub const DEFAULT_HEARTBEAT_PATH: &str = "/heartbeat";
/// Default period between two heartbeat checks.
pub const DEFAULT_HEARTBEAT_PERIOD: Duration = Duration::from_secs(60);

/// Reads the heartbeat counter once per period and publishes liveness.
pub struct HeartbeatWatchdog<RS, LS> {
    store: Arc<RS>,
    liveness: LS,
    path: String,
    period: Duration,
}

impl<RS, LS> HeartbeatWatchdog<RS, LS>
where
    RS: RealtimeStore + Send + Sync + 'static,
    LS: LivenessStore + Send + Sync + 'static,
{
    /// Create a watchdog reading [`DEFAULT_HEARTBEAT_PATH`] every
    /// [`DEFAULT_HEARTBEAT_PERIOD`].
    pub fn new(store: Arc<RS>, liveness: LS) -> Self {
        Self {
            store,
            liveness,
            path: DEFAULT_HEARTBEAT_PATH.to_string(),
            period: DEFAULT_HEARTBEAT_PERIOD,
        }
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    #[must_use]
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Spawn the watchdog loop. The first check happens one period from now.
    #[must_use]
    pub fn spawn(self) -> WatchdogHandle {
        let (stop, stop_rx) = oneshot::channel();
        let (liveness_tx, liveness) = watch::channel(Liveness::Unknown);
        // Anchored here, not when the task first polls.
        let first_check = Instant::now() + self.period;
        let task = tokio::spawn(self.run(first_check, stop_rx, liveness_tx));
        WatchdogHandle {
            liveness,
            stop,
            task,
        }
    }

    async fn run(
        self,
        first_check: Instant,
        mut stop: oneshot::Receiver<()>,
        liveness_tx: watch::Sender<Liveness>,
    ) {
        let mut ticker = tokio::time::interval_at(first_check, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut state = HeartbeatState::new();
        tracing::info!(path = %self.path, period = ?self.period, "heartbeat watchdog started");

        loop {
            tokio::select! {
                biased;
                _ = &mut stop => break,
                _ = ticker.tick() => {}
            }
            self.check(&mut state).await;
            liveness_tx.send_replace(state.liveness());
        }
        tracing::info!("heartbeat watchdog stopped");
    }

    async fn check(&self, state: &mut HeartbeatState) {
        let online = match self.store.read(&self.path).await {
            Ok(value) => {
                tracing::debug!(%value, "heartbeat read");
                state.observe(value)
            }
            Err(err) => {
                tracing::warn!(%err, path = %self.path, "heartbeat read failed");
                Some(state.read_failed())
            }
        };
        let Some(online) = online else {
            return;
        };
        if let Err(err) = self.liveness.publish(online).await {
            tracing::warn!(%err, online, "liveness publish failed");
        }
    }
}

/// Handle on a spawned [`HeartbeatWatchdog`].
pub struct WatchdogHandle {
    liveness: watch::Receiver<Liveness>,
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl WatchdogHandle {
    /// Receiver of the latest liveness verdict.
    #[must_use]
    pub fn liveness(&self) -> watch::Receiver<Liveness> {
        self.liveness.clone()
    }

    /// Stop the watchdog and wait for its task to exit.
    pub async fn stop(self) {
        let _ = self.stop.send(());
        if let Err(err) = self.task.await {
            tracing::warn!(%err, "heartbeat watchdog ended abnormally");
        }
    }
}
