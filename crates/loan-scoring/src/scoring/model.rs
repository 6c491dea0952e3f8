use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::features::ApplicationFeatures;
use super::forest::RandomForest;
use super::rules::RuleScorer;

/// Capability shared by every scoring strategy.
pub trait ApprovalModel {
    /// Probability in `[0, 1]` that the application would be approved.
    fn approval_probability(&self, features: &ApplicationFeatures) -> f64;

    /// Integer score in `[0, 100]`.
    fn score(&self, features: &ApplicationFeatures) -> u8 {
        let scaled = (self.approval_probability(features) * 100.0).round();
        scaled.clamp(0.0, 100.0) as u8
    }
}

/// The persisted strategy. Exactly one is active per process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum ScoringModel {
    RuleBased(RuleScorer),
    RandomForest(RandomForest),
}

impl ScoringModel {
    pub fn kind(&self) -> StrategyKind {
        match self {
            ScoringModel::RuleBased(_) => StrategyKind::RuleBased,
            ScoringModel::RandomForest(_) => StrategyKind::RandomForest,
        }
    }
}

impl ApprovalModel for ScoringModel {
    fn approval_probability(&self, features: &ApplicationFeatures) -> f64 {
        match self {
            ScoringModel::RuleBased(rules) => rules.approval_probability(features),
            ScoringModel::RandomForest(forest) => forest.approval_probability(features),
        }
    }

    fn score(&self, features: &ApplicationFeatures) -> u8 {
        match self {
            ScoringModel::RuleBased(rules) => rules.score(features),
            ScoringModel::RandomForest(forest) => forest.score(features),
        }
    }
}

/// Label for the active strategy, used in logs and API payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    RuleBased,
    RandomForest,
}

impl StrategyKind {
    pub const fn label(self) -> &'static str {
        match self {
            StrategyKind::RuleBased => "rule_based",
            StrategyKind::RandomForest => "random_forest",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// On-disk wrapper around the chosen strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub trained_at: DateTime<Utc>,
    /// Decided records available when the strategy was chosen.
    pub training_records: usize,
    pub model: ScoringModel,
}

impl ModelArtifact {
    pub fn new(model: ScoringModel, training_records: usize) -> Self {
        Self {
            trained_at: Utc::now(),
            training_records,
            model,
        }
    }
}
