//! Turns submitted form values into the model's input record.
//!
//! Column names come from the schema, so the record always carries the exact
//! names the model was trained with. Each field is checked on its own; there
//! is no cross-field validation (a High below Low is passed through).

use crate::types::record::{Record, Schema};
use std::collections::HashMap;
use thiserror::Error;

/// A submitted value the form cannot accept
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormError {
    #[error("{label}: '{raw}' is not a number")]
    NotANumber { label: String, raw: String },

    #[error("{label}: {value} is outside the allowed range {range}")]
    OutOfRange {
        label: String,
        value: f64,
        range: String,
    },
}

/// Builds one-row records from raw form submissions.
pub struct FeatureExtractor;

impl FeatureExtractor {
    /// Create a new feature extractor.
    pub fn new() -> Self {
        Self
    }

    /// Build the record for `schema` from submitted `name -> raw value` pairs.
    ///
    /// Missing or blank fields take their default. Keys not in the schema
    /// are ignored.
    pub fn extract(
        &self,
        schema: &Schema,
        submitted: &HashMap<String, String>,
    ) -> Result<Record, FormError> {
        let mut columns = Vec::with_capacity(schema.len());

        for field in schema.fields() {
            let value = match submitted.get(&field.name).map(|raw| raw.trim()) {
                None | Some("") => field.default,
                Some(raw) => match raw.parse::<f64>() {
                    Ok(value) if value.is_finite() => value,
                    _ => {
                        return Err(FormError::NotANumber {
                            label: field.label.clone(),
                            raw: raw.to_string(),
                        })
                    }
                },
            };

            if !field.accepts(value) {
                return Err(FormError::OutOfRange {
                    label: field.label.clone(),
                    value,
                    range: describe_range(field.min, field.max),
                });
            }

            columns.push((field.name.clone(), value));
        }

        Ok(Record::new(columns))
    }

    /// Get the number of features produced for `schema`.
    pub fn feature_count(&self, schema: &Schema) -> usize {
        schema.len()
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn describe_range(min: Option<f64>, max: Option<f64>) -> String {
    match (min, max) {
        (Some(min), Some(max)) => format!("[{}, {}]", min, max),
        (Some(min), None) => format!(">= {}", min),
        (None, Some(max)) => format!("<= {}", max),
        (None, None) => "any".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FormConfig;

    fn submit(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_feature_extraction() {
        let schema = FormConfig::stock_close().fields;
        let extractor = FeatureExtractor::new();

        let record = extractor
            .extract(
                &schema,
                &submit(&[("Open", "101.5"), ("High", "110"), ("Low", "99.25"), ("Volume", "2500")]),
            )
            .unwrap();

        assert_eq!(record.len(), extractor.feature_count(&schema));
        assert_eq!(record.names(), vec!["Open", "High", "Low", "Volume"]);
        assert_eq!(record.values(), vec![101.5, 110.0, 99.25, 2500.0]);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let schema = FormConfig::stock_close().fields;
        let record = FeatureExtractor::new()
            .extract(&schema, &submit(&[("Open", " "), ("Unrelated", "1")]))
            .unwrap();

        assert_eq!(record, Record::from_defaults(&schema));
    }

    #[test]
    fn test_no_cross_field_validation() {
        let schema = FormConfig::stock_close().fields;
        let record = FeatureExtractor::new()
            .extract(&schema, &submit(&[("High", "1"), ("Low", "500")]))
            .unwrap();

        assert_eq!(record.get("High"), Some(1.0));
        assert_eq!(record.get("Low"), Some(500.0));
    }

    #[test]
    fn test_rejects_negative_price() {
        let schema = FormConfig::stock_close().fields;
        let err = FeatureExtractor::new()
            .extract(&schema, &submit(&[("Low", "-1")]))
            .unwrap_err();

        assert!(matches!(err, FormError::OutOfRange { value, .. } if value == -1.0));
        assert!(err.to_string().contains(">= 0"));
    }

    #[test]
    fn test_rejects_indicator_out_of_range() {
        let schema = FormConfig::price_signal().fields;
        let err = FeatureExtractor::new()
            .extract(&schema, &submit(&[("RSI", "120")]))
            .unwrap_err();

        assert!(err.to_string().contains("[0, 100]"));
    }

    #[test]
    fn test_rejects_non_numeric() {
        let schema = FormConfig::price_signal().fields;
        let extractor = FeatureExtractor::new();

        assert!(matches!(
            extractor.extract(&schema, &submit(&[("Close", "abc")])),
            Err(FormError::NotANumber { .. })
        ));
        assert!(matches!(
            extractor.extract(&schema, &submit(&[("Close", "inf")])),
            Err(FormError::NotANumber { .. })
        ));
    }
}
