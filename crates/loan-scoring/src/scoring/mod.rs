//! Loan approval scoring: feature extraction, the two scoring strategies, the
//! explanation ladders, and the load-or-train lifecycle that picks a strategy
//! once per process.

pub mod explain;
pub mod features;
pub(crate) mod forest;
pub mod history;
pub mod lifecycle;
pub mod model;
pub mod router;
pub mod rules;
pub mod service;
pub mod store;

#[cfg(test)]
mod tests;

pub use explain::{
    explain, AffordabilityMetrics, Explanation, ExplanationComponent, ExplanationFactor,
};
pub use features::{extract, ApplicationFeatures, RawApplication, FEATURE_COUNT};
pub use forest::{FeatureRow, ForestSettings, RandomForest};
pub use history::{parse_history, CsvHistory, DecisionStatus, HistoricalRecord, HistorySource};
pub use lifecycle::{select_strategy, ActiveScorer, ModelLifecycle, ScorerCell, TrainingSettings};
pub use model::{ApprovalModel, ModelArtifact, ScoringModel, StrategyKind};
pub use router::scoring_router;
pub use rules::{RuleFactors, RuleScorer, RuleWeights};
pub use service::{
    LoanAssessment, LoanScoringService, ModelStatusView, ScoreBand, ScoringServiceError,
};
pub use store::{FileModelStore, InMemoryModelStore, ModelStore, StorageError};
