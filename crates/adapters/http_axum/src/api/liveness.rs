//! JSON handler exposing the heartbeat watchdog's verdict.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use alerthub_app::ports::{PushSender, RealtimeStore, RuleStore, UserDirectory};
use alerthub_domain::heartbeat::Liveness;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct LivenessView {
    pub liveness: Liveness,
}

/// `GET /api/liveness`: current liveness of the monitored device.
pub async fn current<RuleS, RS, UD, PS>(
    State(state): State<AppState<RuleS, RS, UD, PS>>,
) -> Json<LivenessView>
where
    RuleS: RuleStore + Send + Sync + 'static,
    RS: RealtimeStore + Send + Sync + 'static,
    UD: UserDirectory + Send + Sync + 'static,
    PS: PushSender + Send + Sync + 'static,
{
    let liveness = *state.liveness.borrow();
    Json(LivenessView { liveness })
}
