use serde::{Deserialize, Serialize};

use super::features::ApplicationFeatures;
use super::model::ApprovalModel;

/// Blend weights for the closed-form scorer. Persisted with the strategy so a
/// reloaded artifact scores exactly as it did when written.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RuleWeights {
    pub base: f64,
    pub credit: f64,
    pub debt_to_income: f64,
    pub loan_to_income: f64,
    pub floor: f64,
    pub ceiling: f64,
}

impl Default for RuleWeights {
    fn default() -> Self {
        Self {
            base: 0.5,
            credit: 0.2,
            debt_to_income: 0.15,
            loan_to_income: 0.15,
            floor: 0.05,
            ceiling: 0.95,
        }
    }
}

/// Deterministic scorer used until enough decided applications exist to train.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RuleScorer {
    #[serde(default)]
    pub weights: RuleWeights,
}

/// Intermediate ratios and factors, exposed for audit views and tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleFactors {
    pub debt_to_income: f64,
    pub loan_to_income: f64,
    pub credit_factor: f64,
    pub dti_factor: f64,
    pub lti_factor: f64,
}

impl RuleScorer {
    pub fn new(weights: RuleWeights) -> Self {
        Self { weights }
    }

    pub fn factors(&self, features: &ApplicationFeatures) -> RuleFactors {
        let annual_income = features.annual_income;
        let monthly_income = features.monthly_income();

        // Zero or negative income is scored as the worst case for both ratios.
        let debt_to_income = if monthly_income > 0.0 {
            features.monthly_debt / monthly_income
        } else {
            1.0
        };
        let loan_to_income = if annual_income > 0.0 {
            features.loan_amount / annual_income
        } else {
            1.0
        };

        RuleFactors {
            debt_to_income,
            loan_to_income,
            credit_factor: clamp((features.credit_score as f64 - 300.0) / 500.0, 0.0, 1.0),
            dti_factor: clamp(1.0 - debt_to_income, 0.0, 1.0),
            lti_factor: clamp(1.0 - loan_to_income, 0.0, 1.0),
        }
    }
}

impl ApprovalModel for RuleScorer {
    fn approval_probability(&self, features: &ApplicationFeatures) -> f64 {
        let weights = &self.weights;
        let factors = self.factors(features);

        let blended = weights.base
            + weights.credit * factors.credit_factor
            + weights.debt_to_income * factors.dti_factor
            + weights.loan_to_income * factors.lti_factor;

        clamp(blended, weights.floor, weights.ceiling)
    }

    /// Truncates rather than rounds; historic scores were recorded this way.
    fn score(&self, features: &ApplicationFeatures) -> u8 {
        let scaled = (self.approval_probability(features) * 100.0).floor();
        clamp(scaled, 0.0, 100.0) as u8
    }
}

/// `max(lower, min(upper, value))`, so a NaN input resolves to `upper`.
fn clamp(value: f64, lower: f64, upper: f64) -> f64 {
    value.min(upper).max(lower)
}
