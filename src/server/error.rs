use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::warn;

use crate::kernel::error::TimerError;
use crate::services::signature::SignatureError;

#[derive(Debug)]
pub enum ApiError {
    Timer(TimerError),
    Signature(SignatureError),
    BadPayload(String),
}

impl From<TimerError> for ApiError {
    fn from(e: TimerError) -> Self {
        ApiError::Timer(e)
    }
}

impl From<SignatureError> for ApiError {
    fn from(e: SignatureError) -> Self {
        ApiError::Signature(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Timer(e) => {
                let status = match e {
                    TimerError::NotFound { .. } => StatusCode::NOT_FOUND,
                    TimerError::InvalidIdentifier(_) => StatusCode::BAD_REQUEST,
                    TimerError::ReactorUnavailable => StatusCode::SERVICE_UNAVAILABLE,
                };
                (status, e.to_string())
            }
            ApiError::Signature(e) => {
                warn!("Rejected webhook: {}", e);
                (StatusCode::UNAUTHORIZED, e.to_string())
            }
            ApiError::BadPayload(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
