//! Configuration management for the predictor front end

use crate::format::DisplayFormat;
use crate::types::prediction::OutputArity;
use crate::types::record::{FieldSpec, Schema};
use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::Path;

/// Default configuration file, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Environment variable that points at an alternative configuration file
pub const CONFIG_PATH_ENV: &str = "PREDICTOR_CONFIG";

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub form: FormConfig,
    pub logging: LoggingConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,
    /// Port to bind
    pub port: u16,
}

/// Model artifact configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Path to the ONNX model file
    pub path: String,
    /// Shape the prediction comes back in
    #[serde(default)]
    pub output: OutputArity,
    /// Number of threads for ONNX inference (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
}

fn default_onnx_threads() -> usize {
    1
}

/// Form layout and result presentation
#[derive(Debug, Clone, Deserialize)]
pub struct FormConfig {
    pub title: String,
    pub description: String,
    /// Entry controls, in the column order the model was trained with
    pub fields: Schema,
    pub display: DisplayFormat,
    /// Text of the submit button
    pub submit_label: String,
    /// Text preceding the formatted prediction
    pub result_label: String,
    #[serde(default)]
    pub disclaimer: String,
}

impl FormConfig {
    /// Closing price regression on Open/High/Low/Volume, shown in rupiah.
    pub fn stock_close() -> Self {
        Self {
            title: "Stock Closing Price Prediction".to_string(),
            description: "Predicts the closing price (Close) from the opening price (Open), \
                          the day's high (High), the day's low (Low) and the traded volume (Volume)."
                .to_string(),
            fields: Schema::new(vec![
                FieldSpec::non_negative("Open", "Opening price (Open)", 100.0, 0.01),
                FieldSpec::non_negative("High", "Highest price (High)", 105.0, 0.01),
                FieldSpec::non_negative("Low", "Lowest price (Low)", 98.0, 0.01),
                FieldSpec::non_negative("Volume", "Trading volume (units)", 1_000_000.0, 1000.0),
            ]),
            display: DisplayFormat::currency("IDR "),
            submit_label: "Predict closing price".to_string(),
            result_label: "Predicted closing price (Close)".to_string(),
            disclaimer: "Predictions are hypothetical and are not financial advice. \
                         Stock markets are volatile and investing carries risk."
                .to_string(),
        }
    }

    /// Next-period price on Close/Volume/RSI/SMA_20, shown in dollars.
    pub fn price_signal() -> Self {
        Self {
            title: "Price Signal Prediction".to_string(),
            description: "Predicts the next price from the current close, volume \
                          and two technical indicators."
                .to_string(),
            fields: Schema::new(vec![
                FieldSpec::non_negative("Close", "Current price", 100.0, 0.01),
                FieldSpec::non_negative("Volume", "Volume", 1_000_000.0, 1000.0),
                FieldSpec::bounded("RSI", "RSI (14)", 50.0, 0.0, 100.0, 1.0),
                FieldSpec::non_negative("SMA_20", "20-day moving average", 100.0, 0.01),
            ]),
            display: DisplayFormat::currency("$"),
            submit_label: "Predict".to_string(),
            result_label: "Predicted price".to_string(),
            disclaimer: "For demonstration only. Not financial advice.".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl AppConfig {
    /// Load configuration from `PREDICTOR_CONFIG`, or the default path
    pub fn load() -> Result<Self> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from_path(path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .with_context(|| format!("Failed to build configuration from {:?}", path.as_ref()))?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8501,
            },
            model: ModelConfig {
                path: "model_saham.onnx".to_string(),
                output: OutputArity::Nested,
                onnx_threads: 1,
            },
            form: FormConfig::stock_close(),
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}
