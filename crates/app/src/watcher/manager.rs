//! Watcher manager: owns one background watcher task per active rule.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use alerthub_domain::id::RuleId;
use alerthub_domain::rule::AutomationRule;
use alerthub_domain::throttle::Throttle;
use serde_json::Value;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_stream::StreamExt;
use tracing::Instrument;

use super::pipeline::Pipeline;
use crate::ports::{PushSender, RealtimeStore, UserDirectory};

/// How a watcher observes its condition path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchMode {
    /// Evaluates every value pushed by the realtime store.
    Event,
    /// Reads the path once per period.
    Interval { period: Duration },
}

impl WatchMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Event => "event",
            Self::Interval { .. } => "interval",
        }
    }

    #[must_use]
    pub fn period(self) -> Option<Duration> {
        match self {
            Self::Event => None,
            Self::Interval { period } => Some(period),
        }
    }
}

impl fmt::Display for WatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Event => f.write_str("event"),
            Self::Interval { period } => write!(f, "interval({period:?})"),
        }
    }
}

/// Tunables shared by every watcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatcherSettings {
    /// Minimum spacing between fires of an event watcher; `None` disables it.
    pub event_cooldown: Option<Duration>,
}

struct WatcherHandle {
    mode: WatchMode,
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl WatcherHandle {
    /// Ask the task to stop and hand back its join handle.
    fn signal(self) -> JoinHandle<()> {
        // The receiver is gone when the task already exited on its own.
        let _ = self.stop.send(());
        self.task
    }
}

/// Registry of running watchers, at most one per rule.
///
/// Must be used from within a tokio runtime: [`start`](Self::start) spawns.
pub struct WatcherManager<RS, UD, PS> {
    store: Arc<RS>,
    pipeline: Arc<Pipeline<UD, PS>>,
    settings: WatcherSettings,
    watchers: Mutex<HashMap<RuleId, WatcherHandle>>,
}

impl<RS, UD, PS> WatcherManager<RS, UD, PS> {
    /// Create an empty manager reading from `store` and firing through `pipeline`.
    pub fn new(store: Arc<RS>, pipeline: Arc<Pipeline<UD, PS>>) -> Self {
        Self {
            store,
            pipeline,
            settings: WatcherSettings::default(),
            watchers: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: WatcherSettings) -> Self {
        self.settings = settings;
        self
    }

    fn watchers(&self) -> MutexGuard<'_, HashMap<RuleId, WatcherHandle>> {
        self.watchers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of registered watchers.
    pub fn len(&self) -> usize {
        self.watchers().len()
    }

    pub fn is_empty(&self) -> bool {
        self.watchers().is_empty()
    }

    /// Mode of the watcher registered for `rule_id`, if any.
    pub fn mode_of(&self, rule_id: &RuleId) -> Option<WatchMode> {
        self.watchers().get(rule_id).map(|handle| handle.mode)
    }

    /// Ids of every registered watcher, sorted.
    pub fn rule_ids(&self) -> Vec<RuleId> {
        let mut ids: Vec<RuleId> = self.watchers().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Stop the watcher for `rule_id`. Returns whether one was registered.
    ///
    /// The task finishes any evaluation already in progress but never
    /// starts another one.
    #[tracing::instrument(skip(self), fields(rule_id = %rule_id))]
    pub fn stop(&self, rule_id: &RuleId) -> bool {
        let Some(handle) = self.watchers().remove(rule_id) else {
            return false;
        };
        drop(handle.signal());
        tracing::info!("watcher stopped");
        true
    }

    /// Stop every watcher whose id does not satisfy `keep`.
    ///
    /// Returns the number of watchers stopped.
    pub fn retain(&self, mut keep: impl FnMut(&RuleId) -> bool) -> usize {
        let removed: Vec<(RuleId, WatcherHandle)> = {
            let mut watchers = self.watchers();
            let stale: Vec<RuleId> = watchers.keys().filter(|id| !keep(id)).cloned().collect();
            stale
                .into_iter()
                .filter_map(|id| watchers.remove(&id).map(|handle| (id, handle)))
                .collect()
        };
        for (rule_id, handle) in &removed {
            tracing::info!(%rule_id, mode = %handle.mode, "watcher stopped during reconciliation");
        }
        let count = removed.len();
        for (_, handle) in removed {
            drop(handle.signal());
        }
        count
    }

    /// Stop every watcher and wait for their tasks to finish.
    pub async fn stop_all(&self) {
        let handles: Vec<WatcherHandle> = self.watchers().drain().map(|(_, h)| h).collect();
        let count = handles.len();
        let tasks: Vec<JoinHandle<()>> = handles.into_iter().map(WatcherHandle::signal).collect();
        for task in tasks {
            if let Err(err) = task.await {
                tracing::warn!(%err, "watcher task ended abnormally");
            }
        }
        tracing::info!(count, "all watchers stopped");
    }
}

impl<RS, UD, PS> WatcherManager<RS, UD, PS>
where
    RS: RealtimeStore + Send + Sync + 'static,
    UD: UserDirectory + Send + Sync + 'static,
    PS: PushSender + Send + Sync + 'static,
{
    /// Start watching the rule described by `document`, replacing any
    /// watcher already registered for `rule_id`.
    ///
    /// Returns the mode of the new watcher, or `None` when the document is
    /// not an actionable rule. In that case the previous watcher, if any,
    /// is stopped and nothing replaces it.
    #[tracing::instrument(skip(self, document), fields(rule_id = %rule_id))]
    pub fn start(&self, rule_id: RuleId, document: &Value) -> Option<WatchMode> {
        let rule = match AutomationRule::from_document(document) {
            Ok(rule) => rule,
            Err(err) => {
                tracing::info!(%err, "rule skipped");
                self.stop(&rule_id);
                return None;
            }
        };

        let mut watchers = self.watchers();
        let replaced = watchers.remove(&rule_id).map(WatcherHandle::signal).is_some();

        let (stop, stop_rx) = oneshot::channel();
        let span = tracing::info_span!("watcher", rule_id = %rule_id);
        let store = Arc::clone(&self.store);
        let pipeline = Arc::clone(&self.pipeline);
        let (mode, task) = match rule.period() {
            Some(period) => {
                // Anchored here, not when the task first polls.
                let first_tick = Instant::now() + period;
                let task = watch_interval(
                    rule_id.clone(),
                    rule,
                    first_tick,
                    period,
                    store,
                    pipeline,
                    stop_rx,
                );
                (
                    WatchMode::Interval { period },
                    tokio::spawn(task.instrument(span)),
                )
            }
            None => (
                WatchMode::Event,
                tokio::spawn(
                    watch_events(
                        rule_id.clone(),
                        rule,
                        self.settings.event_cooldown,
                        store,
                        pipeline,
                        stop_rx,
                    )
                    .instrument(span),
                ),
            ),
        };
        watchers.insert(rule_id, WatcherHandle { mode, stop, task });
        drop(watchers);

        tracing::info!(%mode, replaced, "watcher started");
        Some(mode)
    }
}

async fn watch_events<RS, UD, PS>(
    rule_id: RuleId,
    rule: AutomationRule,
    cooldown: Option<Duration>,
    store: Arc<RS>,
    pipeline: Arc<Pipeline<UD, PS>>,
    mut stop: oneshot::Receiver<()>,
) where
    RS: RealtimeStore + Send + Sync,
    UD: UserDirectory + Send + Sync,
    PS: PushSender + Send + Sync,
{
    let path = rule.condition.path.as_str();
    let subscription = tokio::select! {
        biased;
        _ = &mut stop => return,
        subscription = store.subscribe(path) => subscription,
    };
    let mut updates = match subscription {
        Ok(updates) => updates,
        Err(err) => {
            tracing::warn!(%err, path, "subscription failed, watcher exiting");
            return;
        }
    };

    let mut throttle = cooldown.map(Throttle::new);
    loop {
        let update = tokio::select! {
            biased;
            _ = &mut stop => break,
            update = updates.next() => update,
        };
        match update {
            Some(Ok(current)) => {
                let observed_at = Instant::now().into_std();
                pipeline
                    .run(&rule_id, &rule, &current, throttle.as_mut(), observed_at)
                    .await;
            }
            Some(Err(err)) => tracing::warn!(%err, path, "subscription error"),
            None => {
                tracing::info!(path, "subscription closed, watcher exiting");
                break;
            }
        }
    }
}

async fn watch_interval<RS, UD, PS>(
    rule_id: RuleId,
    rule: AutomationRule,
    first_tick: Instant,
    period: Duration,
    store: Arc<RS>,
    pipeline: Arc<Pipeline<UD, PS>>,
    mut stop: oneshot::Receiver<()>,
) where
    RS: RealtimeStore + Send + Sync,
    UD: UserDirectory + Send + Sync,
    PS: PushSender + Send + Sync,
{
    let path = rule.condition.path.as_str();
    let mut ticker = tokio::time::interval_at(first_tick, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut throttle = Throttle::new(period);

    loop {
        let tick = tokio::select! {
            biased;
            _ = &mut stop => break,
            tick = ticker.tick() => tick,
        };
        match store.read(path).await {
            Ok(current) => {
                pipeline
                    .run(&rule_id, &rule, &current, Some(&mut throttle), tick.into_std())
                    .await;
            }
            Err(err) => tracing::warn!(%err, path, "periodic read failed, tick skipped"),
        }
    }
}
