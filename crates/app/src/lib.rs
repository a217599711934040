//! # alerthub-app
//!
//! Application layer: use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `RuleStore`: rule documents and their change feed
//!   - `RealtimeStore`: point reads, subscriptions and writes of observed values
//!   - `UserDirectory`: users and their device tokens
//!   - `PushSender`: push notification transport
//!   - `LivenessStore`: sink for the heartbeat verdict
//! - Provide the **services** behind a rule firing: target resolution and
//!   notification dispatch
//! - Run the background machinery: one watcher per rule (`WatcherManager`),
//!   the rule feed follower (`AutomationRegistry`) and the
//!   `HeartbeatWatchdog`
//!
//! ## Dependency rule
//! Depends on `alerthub-domain` only (plus `tokio` for tasks, timers and channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod automation_registry;
pub mod heartbeat_watchdog;
pub mod ports;
pub mod services;
pub mod watcher;

#[cfg(test)]
mod testing;
