//! Prometheus Metrics Route

use axum::extract::State;
use std::sync::Arc;

use crate::AppState;

/// Render recorded metrics in Prometheus text format
pub async fn render(State(state): State<Arc<AppState>>) -> String {
    state
        .metrics
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default()
}
