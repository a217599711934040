//! In-memory port fakes shared by the unit tests of this crate.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use alerthub_domain::error::HubError;
use alerthub_domain::id::UserId;
use alerthub_domain::rule::{Notification, RuleChange};
use alerthub_domain::user::{DeviceToken, UserRecord};
use serde_json::Value;
use tokio::sync::{broadcast, mpsc};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::{BroadcastStream, UnboundedReceiverStream};

use crate::ports::{
    LivenessStore, PushSender, RealtimeStore, RuleChangeStream, RuleStore, UserDirectory,
    ValueStream,
};

pub fn storage_error(message: &str) -> HubError {
    HubError::Storage(Box::new(std::io::Error::other(message.to_string())))
}

/// Let spawned tasks run until they block again.
pub async fn settle() {
    for _ in 0..64 {
        tokio::task::yield_now().await;
    }
}

#[derive(Default)]
pub struct InMemoryRealtime {
    values: Mutex<HashMap<String, Value>>,
    channels: Mutex<HashMap<String, broadcast::Sender<Value>>>,
    fail_reads: AtomicBool,
    reads: AtomicUsize,
}

impl InMemoryRealtime {
    pub fn set(&self, path: &str, value: Value) {
        self.values.lock().unwrap().insert(path.to_string(), value.clone());
        if let Some(tx) = self.channels.lock().unwrap().get(path) {
            let _ = tx.send(value);
        }
    }

    pub fn get(&self, path: &str) -> Value {
        self.values.lock().unwrap().get(path).cloned().unwrap_or(Value::Null)
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn subscriber_count(&self, path: &str) -> usize {
        self.channels
            .lock()
            .unwrap()
            .get(path)
            .map_or(0, broadcast::Sender::receiver_count)
    }
}

impl RealtimeStore for InMemoryRealtime {
    fn read(&self, path: &str) -> impl Future<Output = Result<Value, HubError>> + Send {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let result = if self.fail_reads.load(Ordering::SeqCst) {
            Err(storage_error("read failed"))
        } else {
            Ok(self.get(path))
        };
        async move { result }
    }

    fn subscribe(&self, path: &str) -> impl Future<Output = Result<ValueStream, HubError>> + Send {
        let values = self.values.lock().unwrap();
        let current = values.get(path).cloned().unwrap_or(Value::Null);
        let rx = self
            .channels
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_insert_with(|| broadcast::channel(64).0)
            .subscribe();
        drop(values);
        let updates = BroadcastStream::new(rx)
            .map(|item| item.map_err(|err| storage_error(&err.to_string())));
        let stream: ValueStream = Box::pin(tokio_stream::once(Ok(current)).chain(updates));
        async move { Ok(stream) }
    }

    fn write(&self, path: &str, value: Value) -> impl Future<Output = Result<(), HubError>> + Send {
        self.set(path, value);
        async { Ok(()) }
    }
}

#[derive(Default)]
pub struct InMemoryUsers {
    users: Mutex<Vec<UserRecord>>,
    fail: AtomicBool,
}

impl InMemoryUsers {
    pub fn with(users: Vec<UserRecord>) -> Self {
        Self {
            users: Mutex::new(users),
            fail: AtomicBool::new(false),
        }
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl UserDirectory for InMemoryUsers {
    fn get_by_uid(
        &self,
        uid: &UserId,
    ) -> impl Future<Output = Result<Option<UserRecord>, HubError>> + Send {
        let result = if self.fail.load(Ordering::SeqCst) {
            Err(storage_error("directory unavailable"))
        } else {
            Ok(self.users.lock().unwrap().iter().find(|u| &u.uid == uid).cloned())
        };
        async move { result }
    }

    fn find_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<UserRecord>, HubError>> + Send {
        let result = if self.fail.load(Ordering::SeqCst) {
            Err(storage_error("directory unavailable"))
        } else {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.email.as_deref() == Some(email))
                .cloned())
        };
        async move { result }
    }
}

/// Records every send; tokens listed in `rejected` fail.
#[derive(Default)]
pub struct SpyPushSender {
    sent: Mutex<Vec<(DeviceToken, Notification)>>,
    rejected: Mutex<Vec<String>>,
}

impl SpyPushSender {
    pub fn reject(&self, token: &str) {
        self.rejected.lock().unwrap().push(token.to_string());
    }

    pub fn sent(&self) -> Vec<(DeviceToken, Notification)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

impl PushSender for SpyPushSender {
    fn send(
        &self,
        token: &DeviceToken,
        notification: &Notification,
    ) -> impl Future<Output = Result<(), HubError>> + Send {
        let rejected = self.rejected.lock().unwrap().iter().any(|t| t == token.as_str());
        let result = if rejected {
            Err(HubError::Delivery(Box::new(std::io::Error::other(
                "token rejected",
            ))))
        } else {
            self.sent
                .lock()
                .unwrap()
                .push((token.clone(), notification.clone()));
            Ok(())
        };
        async move { result }
    }
}

#[derive(Default)]
pub struct SpyLiveness {
    published: Mutex<Vec<bool>>,
}

impl SpyLiveness {
    pub fn published(&self) -> Vec<bool> {
        self.published.lock().unwrap().clone()
    }
}

impl LivenessStore for SpyLiveness {
    fn publish(&self, online: bool) -> impl Future<Output = Result<(), HubError>> + Send {
        self.published.lock().unwrap().push(online);
        async { Ok(()) }
    }
}

/// Rule feed driven by the test: each subscription gets a fresh channel.
#[derive(Default)]
pub struct ScriptedRuleFeed {
    senders: Mutex<Vec<mpsc::UnboundedSender<Result<Vec<RuleChange>, HubError>>>>,
    fail_subscribe: AtomicBool,
    attempts: AtomicUsize,
}

impl ScriptedRuleFeed {
    pub fn subscriptions(&self) -> usize {
        self.senders.lock().unwrap().len()
    }

    /// Calls to `subscribe`, failed ones included.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Push a batch to the latest subscription.
    pub fn push(&self, batch: Vec<RuleChange>) {
        if let Some(tx) = self.senders.lock().unwrap().last() {
            let _ = tx.send(Ok(batch));
        }
    }

    /// Push an error item to the latest subscription.
    pub fn push_error(&self) {
        if let Some(tx) = self.senders.lock().unwrap().last() {
            let _ = tx.send(Err(storage_error("feed interrupted")));
        }
    }

    pub fn fail_subscribe(&self, fail: bool) {
        self.fail_subscribe.store(fail, Ordering::SeqCst);
    }
}

impl RuleStore for ScriptedRuleFeed {
    fn get_all(
        &self,
    ) -> impl Future<Output = Result<Vec<alerthub_domain::rule::RuleDocument>, HubError>> + Send
    {
        async { Ok(Vec::new()) }
    }

    fn subscribe(&self) -> impl Future<Output = Result<RuleChangeStream, HubError>> + Send {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let result = if self.fail_subscribe.load(Ordering::SeqCst) {
            Err(storage_error("feed unavailable"))
        } else {
            let (tx, rx) = mpsc::unbounded_channel();
            self.senders.lock().unwrap().push(tx);
            let stream: RuleChangeStream = Box::pin(UnboundedReceiverStream::new(rx));
            Ok(stream)
        };
        async move { result }
    }
}
