//! Health Check Route

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::AppState;

pub const SERVER_NAME: &str = "Apartment Price Prediction API";

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub server: String,
    pub models_loaded: Vec<String>,
}

/// Report liveness and the loaded model names
pub async fn healthcheck(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        server: SERVER_NAME.to_string(),
        models_loaded: state.registry.names(),
    })
}
