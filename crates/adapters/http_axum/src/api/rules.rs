//! JSON handler listing stored rules with their watcher status.

use axum::Json;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::Value;

use alerthub_app::ports::{PushSender, RealtimeStore, RuleStore, UserDirectory};
use alerthub_domain::id::RuleId;

use crate::error::ApiError;
use crate::state::AppState;

/// One stored rule and whether a watcher is running for it.
#[derive(Debug, Serialize)]
pub struct RuleView {
    pub id: RuleId,
    pub data: Value,
    pub watching: bool,
    /// `"event"` or `"interval"`; absent when no watcher runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<&'static str>,
}

/// Body of `GET /api/rules`.
#[derive(Debug, Serialize)]
pub struct RuleList {
    pub count: usize,
    pub rules: Vec<RuleView>,
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<RuleList>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /api/rules`: list stored rules and their watcher mode.
pub async fn list<RuleS, RS, UD, PS>(
    State(state): State<AppState<RuleS, RS, UD, PS>>,
) -> Result<ListResponse, ApiError>
where
    RuleS: RuleStore + Send + Sync + 'static,
    RS: RealtimeStore + Send + Sync + 'static,
    UD: UserDirectory + Send + Sync + 'static,
    PS: PushSender + Send + Sync + 'static,
{
    let documents = state.rules.get_all().await?;
    let rules: Vec<RuleView> = documents
        .into_iter()
        .map(|doc| {
            let mode = state.manager.mode_of(&doc.id);
            RuleView {
                watching: mode.is_some(),
                mode: mode.map(|m| m.as_str()),
                id: doc.id,
                data: doc.data,
            }
        })
        .collect();
    Ok(ListResponse::Ok(Json(RuleList {
        count: rules.len(),
        rules,
    })))
}
