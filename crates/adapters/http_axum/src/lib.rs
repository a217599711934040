//! # alerthub-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve a small **read-only JSON API** for operators
//!   (`/api/rules`, `/api/realtime`, `/api/liveness`)
//! - Expose a `/health` probe
//! - Map application results and [`HubError`](alerthub_domain::error::HubError)s
//!   into HTTP responses
//!
//! The engine is driven by the rule feed, not by HTTP: there are no
//! mutation endpoints.
//!
//! ## Dependency rule
//! Depends on `alerthub-app` (for port traits and the watcher manager) and
//! `alerthub-domain` (for response mapping). Never leaks axum types into the
//! domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
