//! Automation registry: keeps the watcher set in sync with the rule store.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use alerthub_domain::id::RuleId;
use alerthub_domain::rule::RuleChange;
use serde_json::Value;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;

use crate::ports::{PushSender, RealtimeStore, RuleStore, UserDirectory};
use crate::watcher::WatcherManager;

/// Floor applied to every backoff delay, so a zero policy still yields.
const MIN_RETRY_DELAY: Duration = Duration::from_millis(1);

/// Exponential backoff applied between rule feed subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub initial: Duration,
    pub max: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(1),
            max: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    fn initial(&self) -> Duration {
        self.initial.max(MIN_RETRY_DELAY)
    }

    fn next(&self, current: Duration) -> Duration {
        current.saturating_mul(2).min(self.max).max(MIN_RETRY_DELAY)
    }
}

/// Applies the rule change feed to a [`WatcherManager`].
pub struct AutomationRegistry<RuleS, RS, UD, PS> {
    rules: RuleS,
    manager: Arc<WatcherManager<RS, UD, PS>>,
    retry: RetryPolicy,
    known: HashMap<RuleId, Value>,
}

impl<RuleS, RS, UD, PS> AutomationRegistry<RuleS, RS, UD, PS>
where
    RuleS: RuleStore + Send + Sync + 'static,
    RS: RealtimeStore + Send + Sync + 'static,
    UD: UserDirectory + Send + Sync + 'static,
    PS: PushSender + Send + Sync + 'static,
{
    /// Create a registry feeding `manager` from `rules`.
    pub fn new(rules: RuleS, manager: Arc<WatcherManager<RS, UD, PS>>) -> Self {
        Self {
            rules,
            manager,
            retry: RetryPolicy::default(),
            known: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Follow the rule feed until `shutdown` resolves.
    ///
    /// A failed subscription, an error item or the end of the stream leads
    /// to a new subscription after a backoff delay. The first batch of each
    /// subscription is treated as a full snapshot: watchers for rules that
    /// no longer appear in it are stopped.
    pub async fn run(mut self, shutdown: impl Future<Output = ()>) {
        tokio::pin!(shutdown);
        let mut delay = self.retry.initial();

        loop {
            let subscription = tokio::select! {
                biased;
                () = &mut shutdown => break,
                subscription = self.rules.subscribe() => subscription,
            };

            match subscription {
                Ok(mut batches) => {
                    tracing::info!("rule feed subscribed");
                    let mut snapshot = true;
                    loop {
                        let item = tokio::select! {
                            biased;
                            () = &mut shutdown => return,
                            item = batches.next() => item,
                        };
                        match item {
                            Some(Ok(batch)) => {
                                if snapshot {
                                    self.reconcile(batch);
                                    snapshot = false;
                                } else {
                                    self.apply(batch);
                                }
                                delay = self.retry.initial();
                            }
                            Some(Err(err)) => {
                                tracing::warn!(%err, "rule feed error");
                                break;
                            }
                            None => {
                                tracing::warn!("rule feed closed");
                                break;
                            }
                        }
                    }
                }
                Err(err) => tracing::warn!(%err, "rule feed subscription failed"),
            }

            tracing::info!(?delay, "resubscribing to rule feed");
            tokio::select! {
                biased;
                () = &mut shutdown => break,
                () = tokio::time::sleep(delay) => {}
            }
            delay = self.retry.next(delay);
        }
    }

    /// Spawn [`run`](Self::run) on the runtime.
    #[must_use]
    pub fn spawn(self) -> RegistryHandle {
        let (stop, stop_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(self.run(async move {
            let _ = stop_rx.await;
        }));
        RegistryHandle { stop, task }
    }

    /// Apply a snapshot batch: stop what it no longer lists, then apply it
    /// while leaving unchanged rules running.
    fn reconcile(&mut self, batch: Vec<RuleChange>) {
        let listed: HashMap<&RuleId, &Value> = batch
            .iter()
            .filter_map(|change| match change {
                RuleChange::Added(doc) | RuleChange::Modified(doc) => Some((&doc.id, &doc.data)),
                RuleChange::Removed(_) => None,
            })
            .collect();
        self.known.retain(|id, _| listed.contains_key(id));
        let stopped = self.manager.retain(|id| listed.contains_key(id));
        if stopped > 0 {
            tracing::info!(stopped, "stopped watchers for rules missing from snapshot");
        }

        let changes: Vec<RuleChange> = batch
            .into_iter()
            .filter(|change| match change {
                RuleChange::Added(doc) => self.known.get(&doc.id) != Some(&doc.data),
                _ => true,
            })
            .collect();
        self.apply(changes);
    }

    fn apply(&mut self, batch: Vec<RuleChange>) {
        for change in batch {
            match change {
                RuleChange::Added(doc) | RuleChange::Modified(doc) => {
                    self.manager.start(doc.id.clone(), &doc.data);
                    self.known.insert(doc.id, doc.data);
                }
                RuleChange::Removed(id) => {
                    self.manager.stop(&id);
                    self.known.remove(&id);
                }
            }
        }
    }
}

/// Handle on a spawned registry task.
pub struct RegistryHandle {
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl RegistryHandle {
    /// Stop following the feed and wait for the task to exit.
    ///
    /// Running watchers are left untouched.
    pub async fn stop(self) {
        let _ = self.stop.send(());
        if let Err(err) = self.task.await {
            tracing::warn!(%err, "registry task ended abnormally");
        }
    }
}
