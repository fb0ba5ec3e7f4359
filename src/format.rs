//! Display formatting for predictions and probabilities

use serde::{Deserialize, Serialize};

/// How a scalar prediction is shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DisplayFormat {
    /// Symbol followed by the amount with thousands separators
    Currency { symbol: String },
    /// Plain number with two decimals
    Decimal,
}

impl DisplayFormat {
    pub fn currency(symbol: &str) -> Self {
        DisplayFormat::Currency {
            symbol: symbol.to_string(),
        }
    }

    pub fn render(&self, value: f64) -> String {
        match self {
            DisplayFormat::Currency { symbol } => format!("{}{}", symbol, group_thousands(value)),
            DisplayFormat::Decimal => format!("{:.2}", value),
        }
    }
}

/// Format a probability to two decimals.
pub fn probability(value: f64) -> String {
    format!("{:.2}", value)
}

/// Two decimals with a comma every three integer digits.
fn group_thousands(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let fixed = format!("{:.2}", value.abs());
    let (integer, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(fixed.len() + integer.len() / 3 + 1);
    // "-0.00" is printed as "0.00"
    if value < 0.0 && fixed.bytes().any(|b| matches!(b, b'1'..=b'9')) {
        grouped.push('-');
    }
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped.push('.');
    grouped.push_str(fraction);
    grouped
}
