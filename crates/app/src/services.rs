//! Application services: use-case implementations.
//!
//! Each service struct accepts port trait implementations via generic parameters
//! (constructor injection), keeping this layer decoupled from concrete adapters.

pub mod liveness_flag;
pub mod notification_dispatcher;
pub mod target_resolver;

pub use liveness_flag::RealtimeLivenessFlag;
pub use notification_dispatcher::{DispatchReport, NotificationDispatcher};
pub use target_resolver::TargetResolver;
