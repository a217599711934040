//! # alerthubd: alerthub daemon
//!
//! Composition root that wires all adapters together and runs the engine.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Build the rule and user stores for the configured backend and seed them
//! - Construct the watcher manager, the automation registry and the
//!   heartbeat watchdog, injecting adapters via port traits
//! - Build the axum router and serve it
//! - Tear everything down in order on SIGTERM/SIGINT
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

pub mod config;
pub mod engine;
