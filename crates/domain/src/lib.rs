//! # alerthub-domain
//!
//! Pure domain model for the alerthub notification engine.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Rules** (realtime-store condition → push notification mappings)
//!   and validate loosely-shaped rule documents into them
//! - Evaluate conditions with loose, client-compatible comparison semantics
//! - Define the per-rule **Throttle**
//! - Define **Users** and their device tokens
//! - Define the **Heartbeat** liveness state machine
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod heartbeat;
pub mod rule;
pub mod throttle;
pub mod user;
