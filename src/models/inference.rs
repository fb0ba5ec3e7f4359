//! Inference engine: one record in, one prediction out

use crate::config::AppConfig;
use crate::metrics::InferenceMetrics;
use crate::models::loader::{LoadError, ModelLoader};
use crate::models::predictor::{InferenceError, Predictor};
use crate::types::prediction::{OutputArity, Prediction};
use crate::types::record::{Record, Schema};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Runs the loaded model on one record per submission.
pub struct InferenceEngine {
    /// The model artifact, read-only after load
    model: Box<dyn Predictor>,
    /// Columns the model was trained on
    schema: Schema,
    /// Where the scalar sits in the model's output
    arity: OutputArity,
    metrics: Arc<InferenceMetrics>,
}

impl InferenceEngine {
    /// Wrap an already loaded model.
    pub fn new(model: Box<dyn Predictor>, schema: Schema, arity: OutputArity) -> Self {
        Self {
            model,
            schema,
            arity,
            metrics: Arc::new(InferenceMetrics::new()),
        }
    }

    /// Load the configured model file and wrap it.
    pub fn from_config(config: &AppConfig) -> Result<Self, LoadError> {
        let loader = ModelLoader::with_threads(config.model.onnx_threads);
        let model = loader.load(&config.model.path)?;

        info!(
            output = ?config.model.output,
            fields = ?config.form.fields.names(),
            "Inference engine initialized"
        );

        Ok(Self::new(
            Box::new(model),
            config.form.fields.clone(),
            config.model.output,
        ))
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn arity(&self) -> OutputArity {
        self.arity
    }

    pub fn metrics(&self) -> Arc<InferenceMetrics> {
        self.metrics.clone()
    }

    /// Run one inference action.
    ///
    /// Nothing is cached: every call runs the model on `record` again.
    pub fn run(&mut self, record: &Record) -> Result<Prediction, InferenceError> {
        let start = Instant::now();
        let result = self.run_inner(record);
        let elapsed = start.elapsed();

        match &result {
            Ok(prediction) => {
                self.metrics.record_success(elapsed);
                debug!(
                    value = prediction.value,
                    probabilities = ?prediction.probabilities,
                    latency_us = elapsed.as_micros() as u64,
                    "Inference complete"
                );
            }
            Err(e) => {
                self.metrics.record_failure(elapsed);
                warn!(error = %e, record = ?record.columns(), "Inference failed");
            }
        }

        result
    }

    fn run_inner(&mut self, record: &Record) -> Result<Prediction, InferenceError> {
        self.validate(record)?;

        // A panicking model fails this submission only
        let model = &mut self.model;
        let (output, proba) =
            panic::catch_unwind(AssertUnwindSafe(|| model.predict_with_proba(record)))
                .map_err(|payload| {
                    InferenceError::Runtime(format!("model panicked: {}", panic_message(&*payload)))
                })??;

        let value = output.scalar(self.arity)?;
        let probabilities = proba.map(|p| p.class_pair()).transpose()?;

        Ok(Prediction {
            value,
            probabilities,
        })
    }

    /// The record must carry exactly the schema's columns, in order.
    fn validate(&self, record: &Record) -> Result<(), InferenceError> {
        let expected = self.schema.names();
        let actual = record.names();

        if expected != actual {
            return Err(InferenceError::SchemaMismatch {
                expected: expected.iter().map(|n| n.to_string()).collect(),
                actual: actual.iter().map(|n| n.to_string()).collect(),
            });
        }
        Ok(())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FormConfig;
    use crate::types::prediction::ModelOutput;

    /// Regressor that echoes the sum of the row, optionally with probabilities.
    struct SumModel {
        nested: bool,
        proba: Option<Vec<f64>>,
    }

    impl Predictor for SumModel {
        fn predict(&mut self, record: &Record) -> Result<ModelOutput, InferenceError> {
            let sum: f64 = record.values().iter().sum();
            Ok(if self.nested {
                ModelOutput::Nested(vec![vec![sum]])
            } else {
                ModelOutput::Flat(vec![sum])
            })
        }

        fn supports_proba(&self) -> bool {
            self.proba.is_some()
        }

        fn predict_proba(&mut self, _record: &Record) -> Result<ModelOutput, InferenceError> {
            match &self.proba {
                Some(row) => Ok(ModelOutput::Nested(vec![row.clone()])),
                None => Err(InferenceError::MissingCapability("probability estimation")),
            }
        }
    }

    /// Computes both outputs in one pass; the separate calls must not be used.
    struct SinglePassModel;

    impl Predictor for SinglePassModel {
        fn predict(&mut self, _record: &Record) -> Result<ModelOutput, InferenceError> {
            panic!("predict called separately");
        }

        fn supports_proba(&self) -> bool {
            true
        }

        fn predict_with_proba(
            &mut self,
            _record: &Record,
        ) -> Result<(ModelOutput, Option<ModelOutput>), InferenceError> {
            Ok((
                ModelOutput::Flat(vec![1.0]),
                Some(ModelOutput::Nested(vec![vec![0.25, 0.75]])),
            ))
        }
    }

    struct PanickingModel;

    impl Predictor for PanickingModel {
        fn predict(&mut self, _record: &Record) -> Result<ModelOutput, InferenceError> {
            let empty: Vec<f64> = Vec::new();
            Ok(ModelOutput::Flat(vec![empty[0]]))
        }
    }

    fn engine(nested: bool, proba: Option<Vec<f64>>, arity: OutputArity) -> InferenceEngine {
        InferenceEngine::new(
            Box::new(SumModel { nested, proba }),
            FormConfig::stock_close().fields,
            arity,
        )
    }

    #[test]
    fn test_nested_prediction() {
        let mut engine = engine(true, None, OutputArity::Nested);
        assert_eq!(engine.arity(), OutputArity::Nested);
        let record = Record::from_defaults(engine.schema());

        let prediction = engine.run(&record).unwrap();

        assert_eq!(prediction.value, 100.0 + 105.0 + 98.0 + 1_000_000.0);
        assert_eq!(prediction.probabilities, None);
        assert_eq!(engine.metrics().successes(), 1);
    }

    #[test]
    fn test_arity_mismatch_is_an_error() {
        let mut engine = engine(false, None, OutputArity::Nested);
        let record = Record::from_defaults(engine.schema());

        let err = engine.run(&record).unwrap_err();

        assert!(matches!(err, InferenceError::ShapeMismatch(_)));
        assert_eq!(engine.metrics().failures(), 1);
    }

    #[test]
    fn test_probabilities_take_first_two_classes() {
        let mut engine = engine(false, Some(vec![0.1, 0.7, 0.2]), OutputArity::Flat);
        let record = Record::from_defaults(engine.schema());

        let probabilities = engine.run(&record).unwrap().probabilities.unwrap();

        assert_eq!(probabilities.negative, 0.1);
        assert_eq!(probabilities.positive, 0.7);
    }

    #[test]
    fn test_schema_mismatch() {
        let mut engine = engine(true, None, OutputArity::Nested);
        let record = Record::new(vec![
            ("Open".to_string(), 1.0),
            ("Close".to_string(), 2.0),
        ]);

        let err = engine.run(&record).unwrap_err();
        assert!(matches!(err, InferenceError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_repeated_runs_are_identical() {
        let mut engine = engine(true, Some(vec![0.4, 0.6]), OutputArity::Nested);
        let record = Record::from_defaults(engine.schema());

        let first = engine.run(&record).unwrap();
        let second = engine.run(&record).unwrap();

        assert_eq!(first, second);
        assert_eq!(engine.metrics().successes(), 2);
    }

    #[test]
    fn test_panicking_model_is_an_inference_error() {
        let mut engine = InferenceEngine::new(
            Box::new(PanickingModel),
            FormConfig::stock_close().fields,
            OutputArity::Flat,
        );
        let record = Record::from_defaults(engine.schema());

        let err = engine.run(&record).unwrap_err();

        assert!(matches!(err, InferenceError::Runtime(_)));
        assert!(err.to_string().contains("model panicked"));
        assert_eq!(engine.metrics().failures(), 1);
    }

    #[test]
    fn test_prediction_and_probabilities_in_one_pass() {
        let mut engine = InferenceEngine::new(
            Box::new(SinglePassModel),
            FormConfig::price_signal().fields,
            OutputArity::Flat,
        );
        let record = Record::from_defaults(engine.schema());

        let prediction = engine.run(&record).unwrap();

        assert_eq!(prediction.value, 1.0);
        let probabilities = prediction.probabilities.unwrap();
        assert_eq!((probabilities.negative, probabilities.positive), (0.25, 0.75));
    }
}
