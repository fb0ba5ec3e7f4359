//! Stock Predictor Front End - Main Entry Point
//!
//! Loads the trained model once, then serves the prediction form.

use anyhow::Result;
use stock_predictor_frontend::{config::AppConfig, server::run_server};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;

    // Initialize logging; RUST_LOG takes precedence over the configured level
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(format!(
            "stock_predictor_frontend={},tower_http=info",
            config.logging.level
        ))?,
    };
    if config.logging.format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    info!("Starting Stock Predictor Front End");
    info!(
        title = %config.form.title,
        model = %config.model.path,
        output = ?config.model.output,
        fields = ?config.form.fields.names(),
        "Configuration loaded successfully"
    );

    run_server(config).await
}
