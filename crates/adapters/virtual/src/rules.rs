//! In-memory rule store with a broadcast change feed.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use alerthub_app::ports::{RuleChangeStream, RuleStore};
use alerthub_domain::error::HubError;
use alerthub_domain::id::RuleId;
use alerthub_domain::rule::{RuleChange, RuleDocument};
use serde_json::Value;
use tokio::sync::broadcast;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

use crate::error::VirtualError;

const FEED_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
enum FeedItem {
    Batch(Vec<RuleChange>),
    Interrupted(String),
}

/// [`RuleStore`] keeping rule documents in memory, ordered by id.
pub struct InMemoryRuleStore {
    rules: Mutex<BTreeMap<RuleId, Value>>,
    feed: broadcast::Sender<FeedItem>,
}

impl Default for InMemoryRuleStore {
    fn default() -> Self {
        Self {
            rules: Mutex::new(BTreeMap::new()),
            feed: broadcast::channel(FEED_CAPACITY).0,
        }
    }
}

impl InMemoryRuleStore {
    fn rules(&self) -> MutexGuard<'_, BTreeMap<RuleId, Value>> {
        self.rules.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert or replace a rule, publishing `Added` or `Modified`.
    pub fn put(&self, id: impl Into<RuleId>, document: Value) {
        self.put_all([(id.into(), document)]);
    }

    /// Insert or replace several rules, published as a single batch.
    pub fn put_all(&self, documents: impl IntoIterator<Item = (RuleId, Value)>) {
        let mut rules = self.rules();
        let batch: Vec<RuleChange> = documents
            .into_iter()
            .map(|(id, data)| {
                let doc = RuleDocument::new(id.clone(), data.clone());
                match rules.insert(id, data) {
                    Some(_) => RuleChange::Modified(doc),
                    None => RuleChange::Added(doc),
                }
            })
            .collect();
        self.publish(batch);
    }

    /// Remove a rule. Returns whether it existed.
    pub fn remove(&self, id: &RuleId) -> bool {
        let mut rules = self.rules();
        let existed = rules.remove(id).is_some();
        if existed {
            self.publish(vec![RuleChange::Removed(id.clone())]);
        }
        existed
    }

    /// Emit an error item on every open subscription.
    pub fn inject_feed_error(&self, reason: impl Into<String>) {
        let _ = self.feed.send(FeedItem::Interrupted(reason.into()));
    }

    /// Number of open subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.feed.receiver_count()
    }

    fn publish(&self, batch: Vec<RuleChange>) {
        if batch.is_empty() {
            return;
        }
        // No subscribers is fine: the next subscription starts from a snapshot.
        let _ = self.feed.send(FeedItem::Batch(batch));
    }
}

impl RuleStore for InMemoryRuleStore {
    async fn get_all(&self) -> Result<Vec<RuleDocument>, HubError> {
        Ok(self
            .rules()
            .iter()
            .map(|(id, data)| RuleDocument::new(id.clone(), data.clone()))
            .collect())
    }

    async fn subscribe(&self) -> Result<RuleChangeStream, HubError> {
        let (snapshot, rx) = {
            let rules = self.rules();
            let snapshot: Vec<RuleChange> = rules
                .iter()
                .map(|(id, data)| RuleChange::Added(RuleDocument::new(id.clone(), data.clone())))
                .collect();
            (snapshot, self.feed.subscribe())
        };

        let changes = BroadcastStream::new(rx).map(|item| match item {
            Ok(FeedItem::Batch(batch)) => Ok(batch),
            Ok(FeedItem::Interrupted(reason)) => {
                Err(VirtualError::FeedInterrupted(reason).into())
            }
            Err(BroadcastStreamRecvError::Lagged(missed)) => {
                Err(VirtualError::Lagged(missed).into())
            }
        });
        Ok(Box::pin(tokio_stream::once(Ok(snapshot)).chain(changes)))
    }
}
