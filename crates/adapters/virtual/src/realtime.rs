//! In-memory hierarchical realtime store.
//!
//! Values live in a single JSON tree addressed by `/`-separated paths.
//! Writing `null` deletes a node and empty parents are pruned, so an absent
//! path always reads as `null`. Subscribers of a path are notified whenever
//! a write changes the value at that path, whether the write targeted the
//! path itself, one of its ancestors or one of its descendants.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use alerthub_app::ports::{RealtimeStore, ValueStream};
use alerthub_domain::error::HubError;
use serde_json::{Map, Value};
use tokio::sync::broadcast;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

use crate::error::VirtualError;

const DEFAULT_CHANNEL_CAPACITY: usize = 256;

#[derive(Default)]
struct Tree {
    root: Value,
    subscribers: HashMap<String, broadcast::Sender<Value>>,
}

/// [`RealtimeStore`] backed by an in-process JSON tree.
pub struct InMemoryRealtimeStore {
    tree: Mutex<Tree>,
    capacity: usize,
}

impl Default for InMemoryRealtimeStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl InMemoryRealtimeStore {
    /// Create a store whose per-path channels buffer `capacity` updates.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            tree: Mutex::new(Tree::default()),
            capacity: capacity.max(1),
        }
    }

    fn tree(&self) -> MutexGuard<'_, Tree> {
        self.tree.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current value at `path`, `null` when absent.
    #[must_use]
    pub fn get(&self, path: &str) -> Value {
        lookup(&self.tree().root, &segments(path))
            .cloned()
            .unwrap_or(Value::Null)
    }

    /// Replace the value at `path` and notify affected subscribers.
    pub fn set(&self, path: &str, value: Value) {
        let written = segments(path);
        let mut tree = self.tree();
        tree.subscribers.retain(|_, tx| tx.receiver_count() > 0);

        let affected: Vec<(String, Value)> = tree
            .subscribers
            .keys()
            .filter(|key| related(&segments(key), &written))
            .map(|key| {
                let before = lookup(&tree.root, &segments(key)).cloned().unwrap_or(Value::Null);
                (key.clone(), before)
            })
            .collect();

        assign(&mut tree.root, &written, value);

        for (key, before) in affected {
            let after = lookup(&tree.root, &segments(&key)).cloned().unwrap_or(Value::Null);
            if after != before {
                if let Some(tx) = tree.subscribers.get(&key) {
                    let _ = tx.send(after);
                }
            }
        }
    }

    /// Number of live subscriptions on `path`.
    #[must_use]
    pub fn subscriber_count(&self, path: &str) -> usize {
        self.tree()
            .subscribers
            .get(&normalize(path))
            .map_or(0, broadcast::Sender::receiver_count)
    }
}

impl RealtimeStore for InMemoryRealtimeStore {
    async fn read(&self, path: &str) -> Result<Value, HubError> {
        Ok(self.get(path))
    }

    async fn subscribe(&self, path: &str) -> Result<ValueStream, HubError> {
        let key = normalize(path);
        let (current, rx) = {
            let mut tree = self.tree();
            let current = lookup(&tree.root, &segments(&key))
                .cloned()
                .unwrap_or(Value::Null);
            let capacity = self.capacity;
            let rx = tree
                .subscribers
                .entry(key)
                .or_insert_with(|| broadcast::channel(capacity).0)
                .subscribe();
            (current, rx)
        };

        let updates = BroadcastStream::new(rx).map(|item| {
            item.map_err(|BroadcastStreamRecvError::Lagged(missed)| {
                HubError::from(VirtualError::Lagged(missed))
            })
        });
        Ok(Box::pin(tokio_stream::once(Ok(current)).chain(updates)))
    }

    async fn write(&self, path: &str, value: Value) -> Result<(), HubError> {
        self.set(path, value);
        Ok(())
    }
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn normalize(path: &str) -> String {
    format!("/{}", segments(path).join("/"))
}

/// Whether one path is an ancestor of (or equal to) the other.
fn related(a: &[&str], b: &[&str]) -> bool {
    a.iter().zip(b).all(|(x, y)| x == y)
}

fn lookup<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(root, |node, segment| match node {
        Value::Object(map) => map.get(*segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn assign(node: &mut Value, path: &[&str], value: Value) {
    let Some((head, rest)) = path.split_first() else {
        *node = value;
        return;
    };
    if !node.is_object() {
        if value.is_null() {
            return;
        }
        *node = Value::Object(Map::new());
    }
    let Value::Object(map) = node else {
        return;
    };
    let child = map.entry((*head).to_string()).or_insert(Value::Null);
    assign(child, rest, value);
    if is_empty(child) {
        map.remove(*head);
    }
    if map.is_empty() {
        *node = Value::Null;
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn should_read_null_when_path_absent() {
        let store = InMemoryRealtimeStore::default();
        assert_eq!(store.read("/missing").await.unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn should_read_nested_value_written_at_parent() {
        let store = InMemoryRealtimeStore::default();
        store
            .write("/sensors", json!({"temp": 21, "door": "open"}))
            .await
            .unwrap();

        assert_eq!(store.read("/sensors/temp").await.unwrap(), json!(21));
        assert_eq!(store.read("sensors/door/").await.unwrap(), json!("open"));
    }

    #[tokio::test]
    async fn should_prune_empty_parents_when_null_written() {
        let store = InMemoryRealtimeStore::default();
        store.write("/a/b/c", json!(1)).await.unwrap();
        store.write("/a/b/c", Value::Null).await.unwrap();

        assert_eq!(store.read("/a").await.unwrap(), Value::Null);
        assert_eq!(store.read("/").await.unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn should_yield_current_value_then_each_change() {
        let store = InMemoryRealtimeStore::default();
        store.set("/temp", json!(20));
        let mut stream = store.subscribe("/temp").await.unwrap();

        store.set("/temp", json!(25));
        store.set("/temp", json!(30));

        assert_eq!(stream.next().await.unwrap().unwrap(), json!(20));
        assert_eq!(stream.next().await.unwrap().unwrap(), json!(25));
        assert_eq!(stream.next().await.unwrap().unwrap(), json!(30));
    }

    #[tokio::test]
    async fn should_notify_subscriber_when_ancestor_or_descendant_written() {
        let store = InMemoryRealtimeStore::default();
        let mut child = store.subscribe("/home/temp").await.unwrap();
        let mut parent = store.subscribe("/home").await.unwrap();
        assert_eq!(child.next().await.unwrap().unwrap(), Value::Null);
        assert_eq!(parent.next().await.unwrap().unwrap(), Value::Null);

        store.set("/home", json!({"temp": 19}));
        store.set("/home/temp", json!(22));

        assert_eq!(child.next().await.unwrap().unwrap(), json!(19));
        assert_eq!(child.next().await.unwrap().unwrap(), json!(22));
        assert_eq!(parent.next().await.unwrap().unwrap(), json!({"temp": 19}));
        assert_eq!(parent.next().await.unwrap().unwrap(), json!({"temp": 22}));
    }

    #[tokio::test]
    async fn should_not_notify_when_value_unchanged_or_sibling_written() {
        let store = InMemoryRealtimeStore::default();
        store.set("/temp", json!(20));
        let mut stream = store.subscribe("/temp").await.unwrap();
        assert_eq!(stream.next().await.unwrap().unwrap(), json!(20));

        store.set("/temp", json!(20));
        store.set("/humidity", json!(40));
        store.set("/temp", json!(21));

        assert_eq!(stream.next().await.unwrap().unwrap(), json!(21));
    }

    #[tokio::test]
    async fn should_surface_lag_as_error_item_and_continue() {
        let store = InMemoryRealtimeStore::with_capacity(1);
        let mut stream = store.subscribe("/n").await.unwrap();
        assert_eq!(stream.next().await.unwrap().unwrap(), Value::Null);

        for n in 1..=3 {
            store.set("/n", json!(n));
        }

        assert!(stream.next().await.unwrap().is_err());
        assert_eq!(stream.next().await.unwrap().unwrap(), json!(3));
    }

    #[tokio::test]
    async fn should_drop_subscription_when_stream_dropped() {
        let store = InMemoryRealtimeStore::default();
        let stream = store.subscribe("/temp").await.unwrap();
        assert_eq!(store.subscriber_count("temp"), 1);
        drop(stream);
        assert_eq!(store.subscriber_count("/temp"), 0);
    }
}
