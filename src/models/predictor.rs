//! The contract every model artifact satisfies

use crate::types::prediction::{ModelOutput, ShapeError};
use crate::types::record::Record;
use thiserror::Error;

/// Failures during one inference action. None of these end the session.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("input columns {actual:?} do not match the model schema {expected:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("unexpected model output: {0}")]
    ShapeMismatch(#[from] ShapeError),

    #[error("model does not support {0}")]
    MissingCapability(&'static str),

    #[error("model runtime error: {0}")]
    Runtime(String),
}

/// A loaded, trained model that scores one record at a time.
///
/// Methods take `&mut self` because ONNX Runtime sessions run through a
/// mutable borrow.
pub trait Predictor: Send {
    /// Run the model's prediction on a one-row record.
    fn predict(&mut self, record: &Record) -> Result<ModelOutput, InferenceError>;

    /// Whether [`Predictor::predict_proba`] is available.
    fn supports_proba(&self) -> bool {
        false
    }

    /// Class probabilities for a one-row record.
    fn predict_proba(&mut self, _record: &Record) -> Result<ModelOutput, InferenceError> {
        Err(InferenceError::MissingCapability("probability estimation"))
    }

    /// Prediction and, when supported, class probabilities for one record.
    ///
    /// Models that compute both in one pass override this to run once.
    fn predict_with_proba(
        &mut self,
        record: &Record,
    ) -> Result<(ModelOutput, Option<ModelOutput>), InferenceError> {
        let output = self.predict(record)?;
        let proba = if self.supports_proba() {
            Some(self.predict_proba(record)?)
        } else {
            None
        };
        Ok((output, proba))
    }
}
