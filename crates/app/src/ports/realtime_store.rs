//! Realtime store port: hierarchical key-value data observed by rules.

use std::future::Future;
use std::pin::Pin;

use alerthub_domain::error::HubError;
use serde_json::Value;
use tokio_stream::Stream;

/// Stream of values produced by [`RealtimeStore::subscribe`].
pub type ValueStream = Pin<Box<dyn Stream<Item = Result<Value, HubError>> + Send>>;

/// Path-addressed JSON store supporting point reads and value subscriptions.
pub trait RealtimeStore {
    /// Read the value at `path`; an absent value reads as [`Value::Null`].
    fn read(&self, path: &str) -> impl Future<Output = Result<Value, HubError>> + Send;

    /// Subscribe to `path`.
    ///
    /// The stream first yields the current value, then every subsequent
    /// write. Transient failures surface as error items without ending the
    /// stream.
    fn subscribe(&self, path: &str) -> impl Future<Output = Result<ValueStream, HubError>> + Send;

    /// Write `value` at `path`.
    fn write(&self, path: &str, value: Value) -> impl Future<Output = Result<(), HubError>> + Send;
}

impl<T: RealtimeStore + Send + Sync> RealtimeStore for std::sync::Arc<T> {
    fn read(&self, path: &str) -> impl Future<Output = Result<Value, HubError>> + Send {
        (**self).read(path)
    }

    fn subscribe(&self, path: &str) -> impl Future<Output = Result<ValueStream, HubError>> + Send {
        (**self).subscribe(path)
    }

    fn write(&self, path: &str, value: Value) -> impl Future<Output = Result<(), HubError>> + Send {
        (**self).write(path, value)
    }
}
