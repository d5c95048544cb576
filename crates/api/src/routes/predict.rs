//! Prediction Route

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Json,
};
use data_validator::RawRecord;
use inference_engine::ModelSelector;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::AppState;

/// Query parameters for the predict endpoint
#[derive(Debug, Deserialize)]
pub struct PredictQuery {
    /// Model name, `all`, or absent for the default model
    pub model: Option<String>,
}

/// Response for the predict endpoint
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub predicted_price: f64,
}

/// Predict the price of one listing.
///
/// The model selection is resolved before the body is read, so an unknown
/// model is reported even for a malformed body.
pub async fn predict(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PredictQuery>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let start = Instant::now();

    let selector = ModelSelector::parse(params.model.as_deref(), &state.default_model);
    let selection = state.ensemble.select(&selector, &state.registry)?;

    let Json(body) = body.map_err(|rejection| ApiError::InvalidBody(rejection.body_text()))?;
    let record = RawRecord::from_json(body).map_err(|e| ApiError::InvalidBody(e.to_string()))?;

    let features = state.engineer.engineer(&record)?;
    debug!("Feature vector: {:?}", features);

    let predicted_price = selection.predict(&features)?;

    let elapsed = start.elapsed();
    metrics::counter!("predictions_total").increment(1);
    metrics::histogram!("prediction_latency_seconds").record(elapsed.as_secs_f64());
    info!(
        "Predicted {} with {:?} in {}ms",
        predicted_price,
        selection.names(),
        elapsed.as_millis()
    );

    Ok(Json(PredictResponse { predicted_price }))
}
