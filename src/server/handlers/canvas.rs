use axum::extract::{Json, State};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use super::id_string;
use crate::kernel::error::TimerError;
use crate::kernel::event::TimerKey;
use crate::services::panel::{self, Canvas, PAUSE_BUTTON, REFRESH_BUTTON, RESUME_BUTTON};
use crate::server::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct IdRef {
    #[serde(default)]
    pub id: Value,
}

#[derive(Debug, Deserialize)]
pub struct CanvasContext {
    pub location: Option<String>,
}

/// Body of both `/initialize` and `/submit` panel calls.
#[derive(Debug, Deserialize)]
pub struct CanvasRequest {
    pub admin: Option<IdRef>,
    pub conversation: Option<IdRef>,
    pub context: Option<CanvasContext>,
    pub component_id: Option<String>,
}

impl CanvasRequest {
    fn operator_id(&self) -> Result<String, TimerError> {
        self.admin
            .as_ref()
            .and_then(|a| id_string(&a.id))
            .ok_or(TimerError::InvalidIdentifier("admin.id"))
    }

    fn conversation_id(&self) -> Option<String> {
        self.conversation.as_ref().and_then(|c| id_string(&c.id))
    }

    /// The panel is being shown next to an open conversation.
    fn is_viewing_conversation(&self) -> bool {
        match self.context.as_ref().and_then(|c| c.location.as_deref()) {
            None => true,
            Some(location) => location == "conversation",
        }
    }
}

async fn render_panel(state: &AppState, key: Option<TimerKey>) -> Result<Canvas, ApiError> {
    let Some(key) = key else {
        return Ok(panel::render(None, &[]));
    };
    let now = (state.clock)();
    let timer = match state.timers.current(key.clone(), now).await {
        Ok(snapshot) => Some(snapshot),
        Err(TimerError::NotFound { .. }) => None,
        Err(e) => return Err(e.into()),
    };
    let recent = state.timers.history(key, Some(state.history_display_limit)).await?;
    Ok(panel::render(timer.as_ref(), &recent))
}

/// Panel bootstrap. Opening the panel on a conversation means the operator is viewing it.
pub async fn initialize(
    State(state): State<AppState>,
    Json(request): Json<CanvasRequest>,
) -> Result<Json<Canvas>, ApiError> {
    let operator_id = request.operator_id()?;
    let key = match request.conversation_id() {
        Some(conversation_id) => Some(TimerKey::new(&operator_id, &conversation_id)?),
        None => None,
    };

    if let Some(key) = &key {
        if request.is_viewing_conversation() {
            let snapshot = state.timers.start(key.clone(), (state.clock)()).await?;
            info!("Panel opened: {} ({:?})", key, snapshot.status);
        }
    }

    Ok(Json(render_panel(&state, key).await?))
}

/// Panel button press.
pub async fn submit(
    State(state): State<AppState>,
    Json(request): Json<CanvasRequest>,
) -> Result<Json<Canvas>, ApiError> {
    let operator_id = request.operator_id()?;
    let conversation_id = request
        .conversation_id()
        .ok_or(TimerError::InvalidIdentifier("conversation.id"))?;
    let key = TimerKey::new(&operator_id, &conversation_id)?;
    let now = (state.clock)();

    let result = match request.component_id.as_deref() {
        Some(PAUSE_BUTTON) => state.timers.pause(key.clone(), now).await.map(|_| ()),
        Some(RESUME_BUTTON) => state.timers.resume(key.clone(), now).await.map(|_| ()),
        Some(REFRESH_BUTTON) | None => Ok(()),
        Some(other) => {
            debug!("Ignoring unknown component {}", other);
            Ok(())
        }
    };
    match result {
        Ok(()) | Err(TimerError::NotFound { .. }) => {}
        Err(e) => return Err(e.into()),
    }

    Ok(Json(render_panel(&state, Some(key)).await?))
}
