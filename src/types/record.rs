//! Input record data structures

use serde::{Deserialize, Serialize};

/// One numeric entry control on the form.
///
/// `name` is the column name the model was trained with and must match it
/// exactly. `label` is what the user sees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Column name used by the model
    pub name: String,

    /// Human readable label
    pub label: String,

    /// Value shown before the user edits anything
    pub default: f64,

    /// Inclusive lower bound (non-negative fields use 0.0)
    #[serde(default)]
    pub min: Option<f64>,

    /// Inclusive upper bound (bounded indicators only)
    #[serde(default)]
    pub max: Option<f64>,

    /// Increment hint for the input control
    #[serde(default = "default_step")]
    pub step: f64,
}

fn default_step() -> f64 {
    0.01
}

impl FieldSpec {
    /// Field with a non-negativity floor and no upper bound.
    pub fn non_negative(name: &str, label: &str, default: f64, step: f64) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            default,
            min: Some(0.0),
            max: None,
            step,
        }
    }

    /// Field constrained to a fixed inclusive range.
    pub fn bounded(name: &str, label: &str, default: f64, min: f64, max: f64, step: f64) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            default,
            min: Some(min),
            max: Some(max),
            step,
        }
    }

    /// Whether `value` lies within the field's bounds.
    pub fn accepts(&self, value: f64) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }
}

/// Ordered set of fields the model expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    fields: Vec<FieldSpec>,
}

impl Schema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Column names in schema order.
    pub fn names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }
}

/// A single row of named numeric feature values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    columns: Vec<(String, f64)>,
}

impl Record {
    /// Build a record from `(name, value)` pairs, keeping their order.
    pub fn new(columns: Vec<(String, f64)>) -> Self {
        Self { columns }
    }

    /// The row every field's default value produces.
    pub fn from_defaults(schema: &Schema) -> Self {
        Self::new(
            schema
                .fields()
                .iter()
                .map(|f| (f.name.clone(), f.default))
                .collect(),
        )
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.columns.iter().map(|&(_, value)| value).collect()
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|&(_, value)| value)
    }

    pub fn columns(&self) -> &[(String, f64)] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
