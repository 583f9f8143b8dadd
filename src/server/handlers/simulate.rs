use axum::extract::{Json, State};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::timers::TimerView;
use crate::kernel::error::TimerError;
use crate::kernel::event::TimerKey;
use crate::server::{ApiError, AppState};

/// UI signals the browser-side script would emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulatedAction {
    Open,
    NavigateAway,
    Return,
    Close,
}

#[derive(Debug, Deserialize)]
pub struct SimulateRequest {
    #[serde(default)]
    pub operator_id: String,
    #[serde(default)]
    pub conversation_id: String,
    pub action: SimulatedAction,
    #[serde(default)]
    pub timestamp: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct SimulateResponse {
    pub timers: Vec<TimerView>,
}

/// Drives the same transitions the inbox UI and webhook would, for manual testing.
/// `NotFound` on pause/return is reported as an empty list.
pub async fn simulate(
    State(state): State<AppState>,
    Json(request): Json<SimulateRequest>,
) -> Result<Json<SimulateResponse>, ApiError> {
    let key = TimerKey::new(&request.operator_id, &request.conversation_id)?;
    let at = state.now_or(request.timestamp);
    info!("Simulated {:?} for {} at {}", request.action, key, at.millis);

    let result = match request.action {
        SimulatedAction::Open => state.timers.start(key, at).await.map(|s| vec![s]),
        SimulatedAction::NavigateAway => state.timers.pause(key, at).await.map(|s| vec![s]),
        SimulatedAction::Return => state.timers.resume(key, at).await.map(|s| vec![s]),
        SimulatedAction::Close => {
            state.timers.stop_all_for_conversation(key.conversation_id, at).await
        }
    };
    let timers = match result {
        Ok(timers) => timers,
        Err(TimerError::NotFound { .. }) => Vec::new(),
        Err(e) => return Err(e.into()),
    };

    Ok(Json(SimulateResponse {
        timers: timers.into_iter().map(TimerView::from).collect(),
    }))
}
