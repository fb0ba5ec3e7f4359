//! Running a loaded ONNX graph on one record

use crate::models::loader::LoadedModel;
use crate::models::predictor::{InferenceError, Predictor};
use crate::types::prediction::ModelOutput;
use crate::types::record::Record;
use ort::memory::Allocator;
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType, DynValue, Tensor};
use tracing::debug;

fn runtime(e: ort::Error) -> InferenceError {
    InferenceError::Runtime(e.to_string())
}

impl LoadedModel {
    /// Bind the record to the graph inputs.
    ///
    /// Graphs exported from a named-column frame declare one input per
    /// column, fed as `[1, 1]`. Graphs with a single input take the whole row
    /// as `[1, N]` in schema order.
    fn bind_inputs(&self, record: &Record) -> Result<Vec<(String, DynValue)>, InferenceError> {
        let names = record.names();

        if self.input_names.len() == names.len()
            && self.input_names.iter().all(|input| names.contains(&input.as_str()))
        {
            return self
                .input_names
                .iter()
                .map(|input| {
                    let value = record.get(input).unwrap_or_default() as f32;
                    let tensor = Tensor::from_array((vec![1_i64, 1], vec![value])).map_err(runtime)?;
                    Ok((input.clone(), tensor.into_dyn()))
                })
                .collect();
        }

        match self.input_names.as_slice() {
            [input] => {
                let values: Vec<f32> = record.values().iter().map(|&v| v as f32).collect();
                let shape = vec![1_i64, values.len() as i64];
                let tensor = Tensor::from_array((shape, values)).map_err(runtime)?;
                Ok(vec![(input.clone(), tensor.into_dyn())])
            }
            _ => Err(InferenceError::SchemaMismatch {
                expected: self.input_names.clone(),
                actual: names.iter().map(|n| n.to_string()).collect(),
            }),
        }
    }

    fn run_output(&mut self, record: &Record, output_name: &str) -> Result<ModelOutput, InferenceError> {
        let inputs = self.bind_inputs(record)?;
        let outputs = self.session.run(inputs).map_err(runtime)?;

        let output = outputs.get(output_name).ok_or_else(|| {
            InferenceError::Runtime(format!("model produced no '{}' output", output_name))
        })?;

        extract_output(output)
    }
}

impl Predictor for LoadedModel {
    fn predict(&mut self, record: &Record) -> Result<ModelOutput, InferenceError> {
        let output_name = self.output_name.clone();
        self.run_output(record, &output_name)
    }

    fn supports_proba(&self) -> bool {
        self.proba_output_name.is_some()
    }

    fn predict_proba(&mut self, record: &Record) -> Result<ModelOutput, InferenceError> {
        let output_name = self
            .proba_output_name
            .clone()
            .ok_or(InferenceError::MissingCapability("probability estimation"))?;
        self.run_output(record, &output_name)
    }

    /// Both outputs come from a single run of the graph.
    fn predict_with_proba(
        &mut self,
        record: &Record,
    ) -> Result<(ModelOutput, Option<ModelOutput>), InferenceError> {
        let inputs = self.bind_inputs(record)?;
        let outputs = self.session.run(inputs).map_err(runtime)?;

        let take = |name: &str| -> Result<ModelOutput, InferenceError> {
            let output = outputs.get(name).ok_or_else(|| {
                InferenceError::Runtime(format!("model produced no '{}' output", name))
            })?;
            extract_output(output)
        };

        let prediction = take(&self.output_name)?;
        let proba = match &self.proba_output_name {
            Some(name) => Some(take(name)?),
            None => None,
        };
        Ok((prediction, proba))
    }
}

/// Convert an ONNX value into a shaped output.
///
/// Handles numeric tensors (regressors, labels, probability matrices) and the
/// seq(map(int64, float)) form classifier exports use for probabilities.
fn extract_output(output: &DynValue) -> Result<ModelOutput, InferenceError> {
    if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
        return shape_tensor(shape, data.iter().map(|&v| v as f64).collect());
    }
    if let Ok((shape, data)) = output.try_extract_tensor::<f64>() {
        return shape_tensor(shape, data.to_vec());
    }
    if let Ok((shape, data)) = output.try_extract_tensor::<i64>() {
        return shape_tensor(shape, data.iter().map(|&v| v as f64).collect());
    }

    let dtype = output.dtype();
    if DynSequenceValueType::can_downcast(&dtype) {
        return extract_from_sequence_map(output);
    }

    Err(InferenceError::Runtime(format!(
        "unsupported output type {:?}",
        dtype
    )))
}

fn shape_tensor(dims: &[i64], data: Vec<f64>) -> Result<ModelOutput, InferenceError> {
    match dims {
        [] | [_] => Ok(ModelOutput::Flat(data)),
        [_, width] => {
            let width = (*width).max(1) as usize;
            Ok(ModelOutput::Nested(
                data.chunks(width).map(|row| row.to_vec()).collect(),
            ))
        }
        _ => Err(InferenceError::Runtime(format!(
            "unsupported output rank {}",
            dims.len()
        ))),
    }
}

/// One row of class probabilities, ordered by class id, from seq(map).
fn extract_from_sequence_map(output: &DynValue) -> Result<ModelOutput, InferenceError> {
    let allocator = Allocator::default();

    let sequence = output
        .downcast_ref::<DynSequenceValueType>()
        .map_err(runtime)?;

    let maps = sequence
        .try_extract_sequence::<DynMapValueType>(&allocator)
        .map_err(runtime)?;

    // One record in, one map out
    let map_value = maps
        .first()
        .ok_or_else(|| InferenceError::Runtime("empty probability sequence".to_string()))?;

    let mut kv_pairs = map_value
        .try_extract_key_values::<i64, f32>()
        .map_err(runtime)?;
    kv_pairs.sort_by_key(|&(class_id, _)| class_id);

    debug!(classes = kv_pairs.len(), "Extracted probabilities from seq(map)");

    Ok(ModelOutput::Nested(vec![kv_pairs
        .into_iter()
        .map(|(_, prob)| prob as f64)
        .collect()]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_tensor_ranks() {
        assert_eq!(
            shape_tensor(&[1], vec![99.9]).unwrap(),
            ModelOutput::Flat(vec![99.9])
        );
        assert_eq!(
            shape_tensor(&[1, 1], vec![42.5]).unwrap(),
            ModelOutput::Nested(vec![vec![42.5]])
        );
        assert_eq!(
            shape_tensor(&[1, 3], vec![0.1, 0.6, 0.3]).unwrap(),
            ModelOutput::Nested(vec![vec![0.1, 0.6, 0.3]])
        );
        assert!(shape_tensor(&[1, 1, 1], vec![1.0]).is_err());
    }

    #[test]
    fn test_scalar_tensor_is_flat() {
        assert_eq!(
            shape_tensor(&[], vec![7.0]).unwrap(),
            ModelOutput::Flat(vec![7.0])
        );
    }
}
