use axum::extract::{Json, Path, Query, State};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::kernel::analytics::SessionAnalytics;
use crate::kernel::error::TimerError;
use crate::kernel::event::{TimerCommand, TimerKey};
use crate::kernel::format::format_duration;
use crate::kernel::state::{SessionRecord, TimerSnapshot};
use crate::server::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct TimerRequest {
    #[serde(default)]
    pub operator_id: String,
    #[serde(default)]
    pub conversation_id: String,
    /// Milliseconds since epoch. Defaults to the server clock.
    #[serde(default)]
    pub timestamp: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct TimerView {
    #[serde(flatten)]
    pub snapshot: TimerSnapshot,
    pub elapsed_formatted: String,
}

impl From<TimerSnapshot> for TimerView {
    fn from(snapshot: TimerSnapshot) -> Self {
        let elapsed_formatted = format_duration(snapshot.elapsed);
        Self { snapshot, elapsed_formatted }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    #[serde(flatten)]
    pub record: SessionRecord,
    pub duration_formatted: String,
}

#[derive(Debug, Serialize)]
pub struct AnalyticsView {
    pub operator_id: String,
    #[serde(flatten)]
    pub analytics: SessionAnalytics,
    pub total_time_formatted: String,
    pub average_time_formatted: String,
    pub median_time_formatted: String,
}

async fn run_command(
    state: &AppState,
    request: TimerRequest,
    command: TimerCommand,
) -> Result<Json<TimerView>, ApiError> {
    let key = TimerKey::new(&request.operator_id, &request.conversation_id)?;
    let at = state.now_or(request.timestamp);
    info!("Timer {:?} for {} at {}", command, key, at.millis);
    let snapshot = state.timers.command(key, command, at).await?;
    Ok(Json(snapshot.into()))
}

pub async fn start_timer(
    State(state): State<AppState>,
    Json(request): Json<TimerRequest>,
) -> Result<Json<TimerView>, ApiError> {
    run_command(&state, request, TimerCommand::Start).await
}

pub async fn pause_timer(
    State(state): State<AppState>,
    Json(request): Json<TimerRequest>,
) -> Result<Json<TimerView>, ApiError> {
    run_command(&state, request, TimerCommand::Pause).await
}

pub async fn resume_timer(
    State(state): State<AppState>,
    Json(request): Json<TimerRequest>,
) -> Result<Json<TimerView>, ApiError> {
    run_command(&state, request, TimerCommand::Resume).await
}

pub async fn stop_timer(
    State(state): State<AppState>,
    Json(request): Json<TimerRequest>,
) -> Result<Json<TimerView>, ApiError> {
    run_command(&state, request, TimerCommand::Stop).await
}

pub async fn list_timers(State(state): State<AppState>) -> Result<Json<Vec<TimerView>>, ApiError> {
    let now = (state.clock)();
    let timers = state.timers.active_timers(now).await?;
    Ok(Json(timers.into_iter().map(TimerView::from).collect()))
}

pub async fn get_timer(
    State(state): State<AppState>,
    Path((operator_id, conversation_id)): Path<(String, String)>,
) -> Result<Json<TimerView>, ApiError> {
    let key = TimerKey::new(&operator_id, &conversation_id)?;
    let snapshot = state.timers.current(key, (state.clock)()).await?;
    Ok(Json(snapshot.into()))
}

pub async fn get_history(
    State(state): State<AppState>,
    Path((operator_id, conversation_id)): Path<(String, String)>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<SessionView>>, ApiError> {
    let key = TimerKey::new(&operator_id, &conversation_id)?;
    let records = state.timers.history(key, query.limit).await?;
    Ok(Json(
        records
            .into_iter()
            .map(|record| SessionView {
                duration_formatted: format_duration(record.final_duration),
                record,
            })
            .collect(),
    ))
}

pub async fn get_analytics(
    State(state): State<AppState>,
    Path(operator_id): Path<String>,
) -> Result<Json<AnalyticsView>, ApiError> {
    let operator_id = operator_id.trim().to_string();
    if operator_id.is_empty() {
        return Err(TimerError::InvalidIdentifier("operator_id").into());
    }
    let analytics = state.timers.analytics(operator_id.clone()).await?;
    Ok(Json(AnalyticsView {
        operator_id,
        total_time_formatted: format_duration(analytics.total_time),
        average_time_formatted: format_duration(analytics.average_time),
        median_time_formatted: format_duration(analytics.median_time),
        analytics,
    }))
}
