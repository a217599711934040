//! # alerthub-adapter-virtual
//!
//! In-memory implementations of every alerthub port, for development,
//! demos and tests.
//!
//! | Adapter | Port | Behaviour |
//! |---------|------|-----------|
//! | [`InMemoryRealtimeStore`] | `RealtimeStore` | JSON tree, per-path broadcast subscriptions |
//! | [`InMemoryRuleStore`] | `RuleStore` | Rule documents with a snapshot-first change feed |
//! | [`InMemoryUserDirectory`] | `UserDirectory` | Users kept in insertion order |
//! | [`LoggingPushSender`] | `PushSender` | Logs notifications into an outbox |
//!
//! [`HeartbeatSimulator`] plays the monitored device by bumping a counter,
//! and [`seed`] loads initial data from JSON files.
//!
//! ## Dependency rule
//!
//! Depends on `alerthub-app` (port traits) and `alerthub-domain` only.

mod error;
mod push;
mod realtime;
mod rules;
pub mod seed;
mod simulator;
mod users;

pub use error::VirtualError;
pub use push::{LoggingPushSender, SentNotification};
pub use realtime::InMemoryRealtimeStore;
pub use rules::InMemoryRuleStore;
pub use simulator::{HeartbeatSimulator, SimulatorHandle};
pub use users::InMemoryUserDirectory;
