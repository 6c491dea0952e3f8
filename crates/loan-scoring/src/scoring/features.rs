use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// Loosely typed application record as submitted by intake forms.
pub type RawApplication = Map<String, Value>;

/// Number of scoring inputs fed to the learned model.
pub const FEATURE_COUNT: usize = 6;

/// The six scoring inputs, normalized from a raw application record.
///
/// No range checks are applied here. A credit score of 900 or a negative
/// term passes through and is handled by the scorer or explainer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ApplicationFeatures {
    pub loan_amount: f64,
    pub loan_term: i64,
    pub annual_income: f64,
    pub employment_length: i64,
    pub credit_score: i64,
    pub monthly_debt: f64,
}

impl ApplicationFeatures {
    /// Raw feature vector in training column order.
    pub fn as_vector(&self) -> [f64; FEATURE_COUNT] {
        [
            self.loan_amount,
            self.loan_term as f64,
            self.annual_income,
            self.employment_length as f64,
            self.credit_score as f64,
            self.monthly_debt,
        ]
    }

    pub fn monthly_income(&self) -> f64 {
        self.annual_income / 12.0
    }
}

/// Builds features from a loose record. Missing or unusable values become zero.
pub fn extract(record: &RawApplication) -> ApplicationFeatures {
    ApplicationFeatures {
        loan_amount: decimal_field(record, "loan_amount"),
        loan_term: integer_field(record, "loan_term"),
        annual_income: decimal_field(record, "annual_income"),
        employment_length: integer_field(record, "employment_length"),
        credit_score: integer_field(record, "credit_score"),
        monthly_debt: decimal_field(record, "monthly_debt"),
    }
}

fn decimal_field(record: &RawApplication, key: &'static str) -> f64 {
    match record.get(key) {
        None => 0.0,
        Some(value) => coerce_number(value).unwrap_or_else(|| {
            debug!(field = key, value = %value, "unusable numeric input, defaulting to 0");
            0.0
        }),
    }
}

fn integer_field(record: &RawApplication, key: &'static str) -> i64 {
    // `as` saturates at the i64 bounds; coerce_number already rejects NaN.
    decimal_field(record, key).round() as i64
}

fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok()
        }
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }?;

    number.is_finite().then_some(number)
}
