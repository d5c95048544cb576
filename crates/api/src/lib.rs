//! Apartment Price Prediction API Server
//!
//! REST API exposing the feature engineering and model ensemble pipeline.

use axum::{
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

mod config;
mod download;
mod error;
mod routes;

pub use config::ApiConfig;
pub use download::{prepare_models_dir, DownloadError, DriveClient, DriveFile};
pub use error::{ApiError, ErrorBody};

use feature_engine::FeatureEngineer;
use inference_engine::{EnsemblePredictor, ModelRegistry};

/// Application state shared across handlers.
///
/// Built once at startup and never mutated, so handlers share it without locks.
pub struct AppState {
    /// Loaded models
    pub registry: Arc<ModelRegistry>,
    /// Raw record preprocessing
    pub engineer: FeatureEngineer,
    /// Model selection and aggregation
    pub ensemble: EnsemblePredictor,
    /// Model used when a request names none
    pub default_model: String,
    /// Prometheus exporter handle, absent when no recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new application state
    pub fn new(registry: ModelRegistry, default_model: impl Into<String>) -> Self {
        Self {
            registry: Arc::new(registry),
            engineer: FeatureEngineer::default(),
            ensemble: EnsemblePredictor::new(),
            default_model: default_model.into(),
            metrics: None,
        }
    }

    /// Attach a Prometheus handle for the metrics endpoint
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthcheck", get(routes::health::healthcheck))
        .route("/predict", post(routes::predict::predict))
        .route("/metrics", get(routes::metrics::render))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Initialize logging
pub fn init_logging(debug: bool) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let level = if debug { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
}

/// Prepare models, load the registry and run the server
pub async fn run_server(config: ApiConfig) -> Result<(), Box<dyn std::error::Error>> {
    prepare_models_dir(&config).await?;
    let registry = ModelRegistry::load_dir(&config.models_dir)?;
    if !registry.contains(&config.default_model) {
        warn!(
            "Default model {} is not loaded; requests without ?model= will be rejected",
            config.default_model
        );
    }

    let metrics = PrometheusBuilder::new().install_recorder()?;
    let state = AppState::new(registry, config.default_model.clone()).with_metrics(metrics);
    let state = Arc::new(state);
    let app = create_router(state);

    let addr = config.bind_addr();
    info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
