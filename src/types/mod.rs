//! Type definitions for the predictor front end

pub mod prediction;
pub mod record;

pub use prediction::{ClassProbabilities, ModelOutput, OutputArity, Prediction};
pub use record::{FieldSpec, Record, Schema};
