//! JSON handler for point reads of the realtime store.

use axum::Json;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use alerthub_app::ports::{PushSender, RealtimeStore, RuleStore, UserDirectory};
use alerthub_domain::error::{HubError, ValidationError};
use alerthub_domain::time::{Timestamp, now};

use crate::error::ApiError;
use crate::state::AppState;

/// Query string of `GET /api/realtime`.
#[derive(Deserialize)]
pub struct ReadQuery {
    pub path: String,
}

/// A value read from the realtime store.
#[derive(Debug, Serialize)]
pub struct RealtimeValue {
    pub path: String,
    pub value: Value,
    pub read_at: Timestamp,
}

/// Possible responses from the read endpoint.
pub enum ReadResponse {
    Ok(Json<RealtimeValue>),
}

impl IntoResponse for ReadResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /api/realtime?path=/x`: read the value currently stored at a path.
pub async fn read<RuleS, RS, UD, PS>(
    State(state): State<AppState<RuleS, RS, UD, PS>>,
    Query(query): Query<ReadQuery>,
) -> Result<ReadResponse, ApiError>
where
    RuleS: RuleStore + Send + Sync + 'static,
    RS: RealtimeStore + Send + Sync + 'static,
    UD: UserDirectory + Send + Sync + 'static,
    PS: PushSender + Send + Sync + 'static,
{
    let path = query.path.trim();
    if path.is_empty() {
        return Err(HubError::from(ValidationError::MissingField("path")).into());
    }
    let value = state.realtime.read(path).await?;
    Ok(ReadResponse::Ok(Json(RealtimeValue {
        path: path.to_string(),
        value,
        read_at: now(),
    })))
}
