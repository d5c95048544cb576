//! Apartment Price Prediction API - Main Entry Point

use api::{init_logging, run_server, ApiConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is not an error
    dotenv::dotenv().ok();

    let config = ApiConfig::load()?;
    init_logging(config.debug)?;

    info!("=== Apartment Price Prediction API v{} ===", env!("CARGO_PKG_VERSION"));
    info!("Models directory: {}", config.models_dir.display());

    run_server(config).await?;

    Ok(())
}
