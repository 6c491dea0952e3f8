use serde::{Deserialize, Serialize};

use super::features::ApplicationFeatures;

/// Scoring dimension a rationale line describes, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExplanationFactor {
    CreditScore,
    DebtToIncome,
    PaymentToIncome,
    LoanToIncome,
}

/// One rationale line, tagged with the dimension it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplanationComponent {
    pub factor: ExplanationFactor,
    pub message: String,
}

/// Four rationale lines in fixed dimension order, never sorted by severity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub components: Vec<ExplanationComponent>,
}

impl Explanation {
    pub fn messages(&self) -> Vec<String> {
        self.components
            .iter()
            .map(|component| component.message.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

/// Ratios behind the explanation ladders. Infinite when the denominator is not positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffordabilityMetrics {
    pub monthly_income: f64,
    pub debt_to_income: f64,
    pub monthly_payment: f64,
    pub payment_to_income: f64,
}

impl AffordabilityMetrics {
    pub fn from_features(features: &ApplicationFeatures) -> Self {
        let monthly_income = features.monthly_income();
        let debt_to_income = if monthly_income > 0.0 {
            features.monthly_debt / monthly_income
        } else {
            f64::INFINITY
        };
        // The term is in years; the payment figure is per year of term.
        let monthly_payment = if features.loan_term > 0 {
            features.loan_amount / features.loan_term as f64
        } else {
            f64::INFINITY
        };
        let payment_to_income = if monthly_income > 0.0 {
            monthly_payment / monthly_income
        } else {
            f64::INFINITY
        };

        Self {
            monthly_income,
            debt_to_income,
            monthly_payment,
            payment_to_income,
        }
    }
}

/// Derives the rationale for a score. Independent of the active strategy.
pub fn explain(features: &ApplicationFeatures) -> Explanation {
    let metrics = AffordabilityMetrics::from_features(features);

    let components = vec![
        ExplanationComponent {
            factor: ExplanationFactor::CreditScore,
            message: credit_score_message(features.credit_score).to_string(),
        },
        ExplanationComponent {
            factor: ExplanationFactor::DebtToIncome,
            message: debt_to_income_message(metrics.debt_to_income).to_string(),
        },
        ExplanationComponent {
            factor: ExplanationFactor::PaymentToIncome,
            message: payment_to_income_message(metrics.payment_to_income).to_string(),
        },
        ExplanationComponent {
            factor: ExplanationFactor::LoanToIncome,
            message: loan_size_message(features.loan_amount, features.annual_income).to_string(),
        },
    ];

    Explanation { components }
}

fn credit_score_message(credit_score: i64) -> &'static str {
    if credit_score >= 750 {
        "Your excellent credit score is favorable for approval."
    } else if credit_score >= 700 {
        "Your good credit score is a positive factor."
    } else if credit_score >= 650 {
        "Your fair credit score may impact your approval odds."
    } else if credit_score >= 600 {
        "Your below-average credit score is a concern."
    } else {
        "Your credit score is too low for most standard loans."
    }
}

fn debt_to_income_message(ratio: f64) -> &'static str {
    if ratio <= 0.2 {
        "Your very low debt-to-income ratio strongly favors approval."
    } else if ratio <= 0.36 {
        "Your debt-to-income ratio is within acceptable limits."
    } else if ratio <= 0.43 {
        "Your debt-to-income ratio is slightly elevated."
    } else {
        "Your high debt-to-income ratio may limit approval chances."
    }
}

fn payment_to_income_message(ratio: f64) -> &'static str {
    if ratio <= 0.1 {
        "The proposed loan payment is easily affordable relative to your income."
    } else if ratio <= 0.28 {
        "The proposed loan payment is reasonably affordable relative to your income."
    } else {
        "The proposed loan payment is high relative to your income."
    }
}

// Compared as multiples of income so zero income needs no special case.
fn loan_size_message(loan_amount: f64, annual_income: f64) -> &'static str {
    if loan_amount <= annual_income * 0.5 {
        "Your requested loan amount is conservative relative to your annual income."
    } else if loan_amount <= annual_income * 2.0 {
        "Your requested loan amount is reasonable relative to your annual income."
    } else {
        "Your requested loan amount is high relative to your annual income."
    }
}
