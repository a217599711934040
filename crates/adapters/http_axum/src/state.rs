//! Shared application state for axum handlers.

use std::sync::Arc;

use tokio::sync::watch;

use alerthub_app::watcher::WatcherManager;
use alerthub_domain::heartbeat::Liveness;

/// Application state shared across all axum handlers.
///
/// Generic over the rule store, realtime store, user directory and push
/// sender to avoid dynamic dispatch. `Clone` is implemented manually so the
/// underlying types themselves do not need to be `Clone`; only the `Arc`
/// wrappers and the liveness receiver are cloned.
pub struct AppState<RuleS, RS, UD, PS> {
    /// Source of the stored rule documents.
    pub rules: Arc<RuleS>,
    /// Realtime store, for point reads.
    pub realtime: Arc<RS>,
    /// Live watcher registry.
    pub manager: Arc<WatcherManager<RS, UD, PS>>,
    /// Latest heartbeat verdict.
    pub liveness: watch::Receiver<Liveness>,
}

impl<RuleS, RS, UD, PS> Clone for AppState<RuleS, RS, UD, PS> {
    fn clone(&self) -> Self {
        Self {
            rules: Arc::clone(&self.rules),
            realtime: Arc::clone(&self.realtime),
            manager: Arc::clone(&self.manager),
            liveness: self.liveness.clone(),
        }
    }
}

impl<RuleS, RS, UD, PS> AppState<RuleS, RS, UD, PS> {
    /// Create a new application state from shared handles.
    pub fn new(
        rules: Arc<RuleS>,
        realtime: Arc<RS>,
        manager: Arc<WatcherManager<RS, UD, PS>>,
        liveness: watch::Receiver<Liveness>,
    ) -> Self {
        Self {
            rules,
            realtime,
            manager,
            liveness,
        }
    }
}
