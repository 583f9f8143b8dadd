use std::sync::Arc;

use axum::{
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::kernel::reactor::TimerHandle;
use crate::kernel::time::Timestamp;
use crate::server::handlers::{canvas, simulate, timers, webhook};

/// Wall clock used by handlers when a request carries no explicit timestamp.
pub type Clock = fn() -> Timestamp;

#[derive(Clone)]
pub struct AppState {
    pub timers: TimerHandle,
    /// Client secret used to verify webhook signatures. `None` disables the check.
    pub webhook_secret: Option<Arc<Vec<u8>>>,
    pub history_display_limit: usize,
    pub clock: Clock,
}

impl AppState {
    pub fn new(timers: TimerHandle) -> Self {
        Self {
            timers,
            webhook_secret: None,
            history_display_limit: 5,
            clock: system_clock,
        }
    }

    pub fn with_webhook_secret(mut self, secret: Option<Vec<u8>>) -> Self {
        self.webhook_secret = secret.map(Arc::new);
        self
    }

    pub fn with_history_display_limit(mut self, limit: usize) -> Self {
        self.history_display_limit = limit;
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Explicit request timestamp wins over the clock.
    pub fn now_or(&self, timestamp: Option<u64>) -> Timestamp {
        timestamp.map(Timestamp::from_millis).unwrap_or_else(self.clock)
    }
}

pub fn system_clock() -> Timestamp {
    Timestamp::from_millis(chrono::Utc::now().timestamp_millis().max(0) as u64)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub fn app_router(state: AppState, static_dir: &str) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/initialize", post(canvas::initialize))
        .route("/submit", post(canvas::submit))
        .route("/webhook", post(webhook::receive))
        .route("/api/timers", get(timers::list_timers))
        .route("/api/timers/start", post(timers::start_timer))
        .route("/api/timers/pause", post(timers::pause_timer))
        .route("/api/timers/resume", post(timers::resume_timer))
        .route("/api/timers/stop", post(timers::stop_timer))
        .route("/api/timers/:operator_id/:conversation_id", get(timers::get_timer))
        .route("/api/history/:operator_id/:conversation_id", get(timers::get_history))
        .route("/api/analytics/:operator_id", get(timers::get_analytics))
        .route("/api/simulate", post(simulate::simulate))
        .fallback_service(ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
