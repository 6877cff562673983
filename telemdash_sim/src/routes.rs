//! HTTP surface: `GET /status` and `POST /command`.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use tracing::{debug, info};

use crate::device::{CommandRequest, StatusReport};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/status", get(status_handler))
        .route("/command", post(command_handler))
        .with_state(state)
}

async fn status_handler(State(state): State<AppState>) -> Json<StatusReport> {
    if state.jitter {
        let delay = state.device.lock().await.response_delay();
        tokio::time::sleep(delay).await;
    }
    let report = state.device.lock().await.sample();
    debug!(sample = report.sample_count, faults = report.faults.len(), "status");
    Json(report)
}

async fn command_handler(
    State(state): State<AppState>,
    Json(req): Json<CommandRequest>,
) -> Json<Value> {
    let reply = state.device.lock().await.apply(&req);
    info!(command = %req.command, ok = %reply["ok"], "command");
    Json(reply)
}
