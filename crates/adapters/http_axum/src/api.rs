//! JSON API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod liveness;
#[allow(clippy::missing_errors_doc)]
pub mod realtime;
#[allow(clippy::missing_errors_doc)]
pub mod rules;

use axum::Router;
use axum::routing::get;

use alerthub_app::ports::{PushSender, RealtimeStore, RuleStore, UserDirectory};

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<RuleS, RS, UD, PS>() -> Router<AppState<RuleS, RS, UD, PS>>
where
    RuleS: RuleStore + Send + Sync + 'static,
    RS: RealtimeStore + Send + Sync + 'static,
    UD: UserDirectory + Send + Sync + 'static,
    PS: PushSender + Send + Sync + 'static,
{
    Router::new()
        .route("/rules", get(rules::list::<RuleS, RS, UD, PS>))
        .route("/realtime", get(realtime::read::<RuleS, RS, UD, PS>))
        .route("/liveness", get(liveness::current::<RuleS, RS, UD, PS>))
}
