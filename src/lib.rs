//! Stock Predictor Front End Library
//!
//! A single-page form that builds one row of named stock features, runs a
//! trained ONNX model on it and renders the prediction.

pub mod config;
pub mod feature_extractor;
pub mod format;
pub mod metrics;
pub mod models;
pub mod server;
pub mod types;

pub use config::{AppConfig, FormConfig};
pub use feature_extractor::{FeatureExtractor, FormError};
pub use format::DisplayFormat;
pub use models::{InferenceEngine, InferenceError, LoadError, ModelLoader, Predictor};
pub use server::{create_router, run_server, AppState};
pub use types::{ModelOutput, OutputArity, Prediction, Record, Schema};
