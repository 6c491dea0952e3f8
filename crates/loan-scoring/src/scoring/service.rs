use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use super::explain::ExplanationComponent;
use super::features::{extract, RawApplication};
use super::history::HistorySource;
use super::lifecycle::{ModelLifecycle, ScorerCell};
use super::model::StrategyKind;
use super::store::{ModelStore, StorageError};

/// Coarse reading of a score, matching the officer dashboard colouring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Strong,
    Moderate,
    Weak,
}

impl ScoreBand {
    pub const fn from_score(score: u8) -> Self {
        if score >= 80 {
            Self::Strong
        } else if score >= 60 {
            Self::Moderate
        } else {
            Self::Weak
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            ScoreBand::Strong => "strong",
            ScoreBand::Moderate => "moderate",
            ScoreBand::Weak => "weak",
        }
    }
}

/// Score and rationale for one application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanAssessment {
    pub score: u8,
    pub band: ScoreBand,
    pub strategy: StrategyKind,
    pub explanations: Vec<ExplanationComponent>,
}

impl LoanAssessment {
    pub fn messages(&self) -> Vec<&str> {
        self.explanations
            .iter()
            .map(|component| component.message.as_str())
            .collect()
    }
}

/// Which strategy is serving scores and where it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelStatusView {
    pub strategy: StrategyKind,
    pub training_records: usize,
    pub trained_at: DateTime<Utc>,
}

/// Facade over the scorer cell used by the HTTP router and the CLI.
pub struct LoanScoringService<S, H> {
    scorers: ScorerCell<S, H>,
}

impl<S, H> LoanScoringService<S, H>
where
    S: ModelStore,
    H: HistorySource,
{
    pub fn new(lifecycle: ModelLifecycle<S, H>) -> Self {
        Self {
            scorers: ScorerCell::new(lifecycle),
        }
    }

    pub fn scorers(&self) -> &ScorerCell<S, H> {
        &self.scorers
    }

    /// Loads or trains the scorer ahead of the first request.
    pub fn warm_up(&self) -> Result<ModelStatusView, StorageError> {
        self.model_status()
    }

    /// Whether a scorer is loaded and assessments can be served without touching storage.
    pub fn is_ready(&self) -> bool {
        self.scorers.is_ready()
    }

    pub fn model_status(&self) -> Result<ModelStatusView, StorageError> {
        let active = self.scorers.get()?;
        let artifact = active.artifact();
        Ok(ModelStatusView {
            strategy: artifact.model.kind(),
            training_records: artifact.training_records,
            trained_at: artifact.trained_at,
        })
    }

    /// Scores and explains a loosely typed application record.
    pub fn assess(&self, record: &RawApplication) -> Result<LoanAssessment, StorageError> {
        let active = self.scorers.get().map_err(|err| {
            warn!(error = %err, "scoring unavailable");
            err
        })?;

        let features = extract(record);
        let score = active.score(&features);
        let explanation = active.explain(&features);

        info!(score, strategy = %active.strategy(), "application assessed");

        Ok(LoanAssessment {
            score,
            band: ScoreBand::from_score(score),
            strategy: active.strategy(),
            explanations: explanation.components,
        })
    }

    /// Same as [`assess`](Self::assess) for an arbitrary JSON payload.
    pub fn assess_json(&self, payload: Value) -> Result<LoanAssessment, ScoringServiceError> {
        let Value::Object(record) = payload else {
            return Err(ScoringServiceError::InvalidPayload(
                "application must be a JSON object",
            ));
        };
        Ok(self.assess(&record)?)
    }
}

/// Error raised by the scoring service.
#[derive(Debug, thiserror::Error)]
pub enum ScoringServiceError {
    #[error("{0}")]
    InvalidPayload(&'static str),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
