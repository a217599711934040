//! Rule store port: source of automation rule documents.

use std::future::Future;
use std::pin::Pin;

use alerthub_domain::error::HubError;
use alerthub_domain::rule::{RuleChange, RuleDocument};
use tokio_stream::Stream;

/// Stream of rule change batches produced by [`RuleStore::subscribe`].
pub type RuleChangeStream = Pin<Box<dyn Stream<Item = Result<Vec<RuleChange>, HubError>> + Send>>;

/// Read access and change feed over the stored rule documents.
pub trait RuleStore {
    /// Every rule document currently stored.
    fn get_all(&self) -> impl Future<Output = Result<Vec<RuleDocument>, HubError>> + Send;

    /// Open a change feed.
    ///
    /// The first batch of every fresh subscription lists all current rules
    /// as [`RuleChange::Added`]; later batches carry incremental changes in
    /// store order. An error item ends the usefulness of the stream and the
    /// caller is expected to resubscribe.
    fn subscribe(&self) -> impl Future<Output = Result<RuleChangeStream, HubError>> + Send;
}

impl<T: RuleStore + Send + Sync> RuleStore for std::sync::Arc<T> {
    fn get_all(&self) -> impl Future<Output = Result<Vec<RuleDocument>, HubError>> + Send {
        (**self).get_all()
    }

    fn subscribe(&self) -> impl Future<Output = Result<RuleChangeStream, HubError>> + Send {
        (**self).subscribe()
    }
}
