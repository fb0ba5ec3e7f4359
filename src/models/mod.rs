//! ML model loading and inference components

pub mod inference;
pub mod loader;
pub mod onnx;
pub mod predictor;

pub use inference::InferenceEngine;
pub use loader::{LoadError, LoadedModel, ModelLoader};
pub use predictor::{InferenceError, Predictor};
