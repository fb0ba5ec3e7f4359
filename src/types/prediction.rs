//! Model output and prediction result structures

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How deep the scalar prediction sits inside the model's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputArity {
    /// `[value]`, read as `result[0]`
    #[default]
    Flat,
    /// `[[value]]`, read as `result[0][0]`
    Nested,
}

/// Raw output of a predictor call, tagged with its shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelOutput {
    Flat(Vec<f64>),
    Nested(Vec<Vec<f64>>),
}

impl ModelOutput {
    pub fn arity(&self) -> OutputArity {
        match self {
            ModelOutput::Flat(_) => OutputArity::Flat,
            ModelOutput::Nested(_) => OutputArity::Nested,
        }
    }

    /// Extract the single prediction, requiring the declared shape.
    pub fn scalar(&self, expected: OutputArity) -> Result<f64, ShapeError> {
        match (self, expected) {
            (ModelOutput::Flat(values), OutputArity::Flat) => {
                values.first().copied().ok_or(ShapeError::Empty)
            }
            (ModelOutput::Nested(rows), OutputArity::Nested) => rows
                .first()
                .and_then(|row| row.first())
                .copied()
                .ok_or(ShapeError::Empty),
            (actual, expected) => Err(ShapeError::Arity {
                expected,
                actual: actual.arity(),
            }),
        }
    }

    /// Class probabilities at indices 0 and 1 of the first row.
    ///
    /// A flat output counts as a single row. Classes past index 1 are dropped.
    pub fn class_pair(&self) -> Result<ClassProbabilities, ShapeError> {
        let row: &[f64] = match self {
            ModelOutput::Flat(values) => values,
            ModelOutput::Nested(rows) => rows.first().map(Vec::as_slice).unwrap_or(&[]),
        };

        match row {
            [negative, positive, ..] => Ok(ClassProbabilities {
                negative: *negative,
                positive: *positive,
            }),
            _ => Err(ShapeError::TooFewClasses(row.len())),
        }
    }
}

/// Why an output could not be unwrapped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShapeError {
    #[error("expected {expected:?} output but the model returned {actual:?}")]
    Arity {
        expected: OutputArity,
        actual: OutputArity,
    },

    #[error("model returned an empty output")]
    Empty,

    #[error("expected at least 2 class probabilities, got {0}")]
    TooFewClasses(usize),
}

/// Probabilities of class 0 and class 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassProbabilities {
    pub negative: f64,
    pub positive: f64,
}

impl ClassProbabilities {
    /// `(index, probability)` pairs in index order.
    pub fn indexed(&self) -> [(usize, f64); 2] {
        [(0, self.negative), (1, self.positive)]
    }
}

/// Result of one inference action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// The unwrapped scalar prediction
    pub value: f64,

    /// Present when the model can estimate class probabilities
    pub probabilities: Option<ClassProbabilities>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_follows_declared_arity() {
        let nested = ModelOutput::Nested(vec![vec![42.5]]);
        let flat = ModelOutput::Flat(vec![99.9, 1.0]);

        assert_eq!(nested.scalar(OutputArity::Nested), Ok(42.5));
        assert_eq!(flat.scalar(OutputArity::Flat), Ok(99.9));
    }

    #[test]
    fn test_scalar_rejects_wrong_arity() {
        let flat = ModelOutput::Flat(vec![99.9]);

        assert_eq!(
            flat.scalar(OutputArity::Nested),
            Err(ShapeError::Arity {
                expected: OutputArity::Nested,
                actual: OutputArity::Flat,
            })
        );
    }

    #[test]
    fn test_scalar_empty_output() {
        assert_eq!(
            ModelOutput::Nested(vec![vec![]]).scalar(OutputArity::Nested),
            Err(ShapeError::Empty)
        );
        assert_eq!(
            ModelOutput::Flat(vec![]).scalar(OutputArity::Flat),
            Err(ShapeError::Empty)
        );
    }

    #[test]
    fn test_class_pair_ignores_extra_classes() {
        let output = ModelOutput::Nested(vec![vec![0.2, 0.5, 0.3]]);
        let pair = output.class_pair().unwrap();

        assert_eq!(pair.negative, 0.2);
        assert_eq!(pair.positive, 0.5);
        assert_eq!(pair.indexed(), [(0, 0.2), (1, 0.5)]);
    }

    #[test]
    fn test_class_pair_single_class() {
        let output = ModelOutput::Nested(vec![vec![1.0]]);
        assert_eq!(output.class_pair(), Err(ShapeError::TooFewClasses(1)));
    }

    #[test]
    fn test_arity_deserialization() {
        let arity: OutputArity = serde_json::from_str("\"nested\"").unwrap();
        assert_eq!(arity, OutputArity::Nested);
    }
}
