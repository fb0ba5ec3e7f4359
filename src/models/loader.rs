//! ONNX model loader

use ort::session::{builder::GraphOptimizationLevel, Session};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info};

/// Startup failures. Either one halts the front end.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("model file '{}' not found; place it next to the application and restart", .0.display())]
    NotFound(PathBuf),

    #[error("failed to load model from '{}': {message}", path.display())]
    Deserialize { path: PathBuf, message: String },
}

/// Loaded ONNX model with metadata
pub struct LoadedModel {
    /// ONNX Runtime session
    pub session: Session,
    /// Declared graph inputs, in order
    pub input_names: Vec<String>,
    /// Output carrying the prediction
    pub output_name: String,
    /// Output carrying class probabilities, for classifiers
    pub proba_output_name: Option<String>,
}

/// Loader for ONNX models
pub struct ModelLoader {
    /// Number of threads for ONNX inference
    onnx_threads: usize,
}

impl ModelLoader {
    /// Create a new model loader with default settings (1 thread)
    pub fn new() -> Self {
        Self::with_threads(1)
    }

    /// Create a new model loader with specified number of threads
    pub fn with_threads(onnx_threads: usize) -> Self {
        Self { onnx_threads }
    }

    /// Load the model file at `path`.
    ///
    /// The graph is not checked against the form schema here; a mismatch
    /// surfaces on the first prediction.
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<LoadedModel, LoadError> {
        let path = path.as_ref();

        if !path.is_file() {
            error!(path = %path.display(), "Model file not found");
            return Err(LoadError::NotFound(path.to_path_buf()));
        }

        info!(path = %path.display(), threads = self.onnx_threads, "Loading ONNX model");

        let session = self.build_session(path).map_err(|e| {
            error!(path = %path.display(), error = %e, "Failed to load model");
            LoadError::Deserialize {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
        })?;

        let input_names: Vec<String> = session.inputs.iter().map(|i| i.name.clone()).collect();

        let proba_output_name = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob"))
            .map(|o| o.name.clone());

        let output_name = session
            .outputs
            .iter()
            .find(|o| !o.name.contains("prob"))
            .map(|o| o.name.clone())
            .ok_or_else(|| LoadError::Deserialize {
                path: path.to_path_buf(),
                message: "model declares no prediction output".to_string(),
            })?;

        info!(
            inputs = ?input_names,
            output = %output_name,
            proba_output = ?proba_output_name,
            "Model loaded successfully"
        );

        Ok(LoadedModel {
            session,
            input_names,
            output_name,
            proba_output_name,
        })
    }

    fn build_session(&self, path: &Path) -> ort::Result<Session> {
        Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(self.onnx_threads)?
            .commit_from_file(path)
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self::new()
    }
}
