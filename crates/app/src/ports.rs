//! Port definitions: traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the use-case layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod liveness;
pub mod push_sender;
pub mod realtime_store;
pub mod rule_store;
pub mod user_directory;

pub use liveness::LivenessStore;
pub use push_sender::PushSender;
pub use realtime_store::{RealtimeStore, ValueStream};
pub use rule_store::{RuleChangeStream, RuleStore};
pub use user_directory::UserDirectory;
