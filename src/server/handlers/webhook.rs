use axum::{
    body::Bytes,
    extract::{Json, State},
    http::HeaderMap,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use super::id_string;
use crate::services::signature::{self, SIGNATURE_HEADER};
use crate::server::{ApiError, AppState};

const CLOSED_TOPICS: [&str; 2] = ["conversation.admin.closed", "conversation.closed"];

#[derive(Debug, Deserialize)]
pub struct WebhookNotification {
    pub topic: String,
    #[serde(default)]
    pub data: Option<WebhookData>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookData {
    pub item: Option<WebhookItem>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookItem {
    #[serde(default)]
    pub id: Value,
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub topic: String,
    pub stopped: usize,
}

/// Signature is checked against the raw body, so the payload is parsed by hand.
pub async fn receive(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, ApiError> {
    if let Some(secret) = &state.webhook_secret {
        let header = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
        signature::verify(secret, &body, header)?;
    }

    let notification: WebhookNotification = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadPayload(format!("invalid webhook payload: {}", e)))?;

    if !CLOSED_TOPICS.contains(&notification.topic.as_str()) {
        debug!("Webhook topic {} acknowledged", notification.topic);
        return Ok(Json(WebhookAck { topic: notification.topic, stopped: 0 }));
    }

    let conversation_id = notification
        .data
        .as_ref()
        .and_then(|d| d.item.as_ref())
        .and_then(|item| id_string(&item.id))
        .ok_or_else(|| ApiError::BadPayload("closed event without data.item.id".to_string()))?;

    let stopped = state
        .timers
        .stop_all_for_conversation(conversation_id.clone(), (state.clock)())
        .await?;
    info!(
        "Webhook {}: conversation {} closed, {} timer(s) stopped",
        notification.topic,
        conversation_id,
        stopped.len()
    );

    Ok(Json(WebhookAck { topic: notification.topic, stopped: stopped.len() }))
}
