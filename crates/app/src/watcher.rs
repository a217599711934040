//! Rule watchers: one background task per active rule.
//!
//! A watcher observes the rule's condition path, either by subscription
//! ([`WatchMode::Event`]) or by periodic reads ([`WatchMode::Interval`]),
//! and runs every observation through the [`Pipeline`].

pub mod manager;
pub mod pipeline;

pub use manager::{WatchMode, WatcherManager, WatcherSettings};
pub use pipeline::{Outcome, Pipeline};
