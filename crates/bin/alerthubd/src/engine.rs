//! Engine assembly: the long-running tasks and their ordered teardown.

use std::sync::Arc;

use axum::Router;
use tokio::sync::watch;

use alerthub_adapter_http_axum::router;
use alerthub_adapter_http_axum::state::AppState;
use alerthub_adapter_virtual::{HeartbeatSimulator, SimulatorHandle};
use alerthub_app::automation_registry::{AutomationRegistry, RegistryHandle, RetryPolicy};
use alerthub_app::heartbeat_watchdog::{HeartbeatWatchdog, WatchdogHandle};
use alerthub_app::ports::{PushSender, RealtimeStore, RuleStore, UserDirectory};
use alerthub_app::services::RealtimeLivenessFlag;
use alerthub_app::watcher::{Pipeline, WatcherManager, WatcherSettings};
use alerthub_domain::heartbeat::Liveness;

use crate::config::Config;

/// Every background task of a running daemon, plus the shared handles the
/// HTTP layer reads from.
pub struct Engine<RuleS, RS, UD, PS> {
    rules: Arc<RuleS>,
    realtime: Arc<RS>,
    manager: Arc<WatcherManager<RS, UD, PS>>,
    registry: RegistryHandle,
    watchdog: Option<WatchdogHandle>,
    simulator: Option<SimulatorHandle>,
    liveness: watch::Receiver<Liveness>,
}

impl<RuleS, RS, UD, PS> Engine<RuleS, RS, UD, PS>
where
    RuleS: RuleStore + Send + Sync + 'static,
    RS: RealtimeStore + Send + Sync + 'static,
    UD: UserDirectory + Send + Sync + 'static,
    PS: PushSender + Send + Sync + 'static,
{
    /// Spawn the registry, the watchdog and the optional simulator.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        config: &Config,
        rules: Arc<RuleS>,
        realtime: Arc<RS>,
        users: UD,
        sender: PS,
    ) -> Self {
        let pipeline = Arc::new(Pipeline::new(users, sender));
        let manager = Arc::new(
            WatcherManager::new(Arc::clone(&realtime), pipeline).with_settings(WatcherSettings {
                event_cooldown: config.event_cooldown(),
            }),
        );

        let registry = AutomationRegistry::new(Arc::clone(&rules), Arc::clone(&manager))
            .with_retry(RetryPolicy {
                initial: config.feed_retry_initial(),
                max: config.feed_retry_max(),
            })
            .spawn();

        let simulator = config.simulator.heartbeat_enabled.then(|| {
            HeartbeatSimulator::new(
                Arc::clone(&realtime),
                config.heartbeat.path.clone(),
                config.simulator_period(),
            )
            .start()
        });

        let (watchdog, liveness) = if config.heartbeat.enabled {
            let flag = RealtimeLivenessFlag::new(
                Arc::clone(&realtime),
                config.heartbeat.status_path.clone(),
            );
            let handle = HeartbeatWatchdog::new(Arc::clone(&realtime), flag)
                .with_path(config.heartbeat.path.clone())
                .with_period(config.heartbeat_period())
                .spawn();
            let liveness = handle.liveness();
            (Some(handle), liveness)
        } else {
            tracing::info!("heartbeat watchdog disabled");
            (None, watch::channel(Liveness::Unknown).1)
        };

        Self {
            rules,
            realtime,
            manager,
            registry,
            watchdog,
            simulator,
            liveness,
        }
    }

    #[must_use]
    pub fn manager(&self) -> &Arc<WatcherManager<RS, UD, PS>> {
        &self.manager
    }

    /// Build the HTTP router over this engine's state.
    pub fn router(&self) -> Router {
        router::build(AppState::new(
            Arc::clone(&self.rules),
            Arc::clone(&self.realtime),
            Arc::clone(&self.manager),
            self.liveness.clone(),
        ))
    }

    /// Stop following the rule feed, then every watcher, then the watchdog.
    pub async fn shutdown(self) {
        self.registry.stop().await;
        self.manager.stop_all().await;
        if let Some(watchdog) = self.watchdog {
            watchdog.stop().await;
        }
        if let Some(simulator) = self.simulator {
            simulator.stop().await;
        }
        tracing::info!("engine stopped");
    }
}
