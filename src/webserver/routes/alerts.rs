/// Spike alert routes
use axum::{extract::State, response::Response, routing::get, Router};
use serde::Serialize;
use std::sync::Arc;

use crate::{
    market::spike::SpikeAlert,
    webserver::{state::AppState, utils::success_response},
};

/// Create alert routes
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/alerts", get(spike_alerts))
}

#[derive(Debug, Serialize)]
struct AlertsResponse {
    alerts: Vec<SpikeAlert>,
    count: usize,
}

/// GET /api/alerts - current spike alerts, newest first
async fn spike_alerts(State(state): State<Arc<AppState>>) -> Response {
    let alerts = state.service.alerts();
    let count = alerts.len();
    success_response(AlertsResponse { alerts, count })
}
