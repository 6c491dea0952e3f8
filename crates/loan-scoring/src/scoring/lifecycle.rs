use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use super::explain::{explain, Explanation};
use super::features::ApplicationFeatures;
use super::forest::{FeatureRow, ForestSettings, RandomForest};
use super::history::{HistoricalRecord, HistorySource};
use super::model::{ApprovalModel, ModelArtifact, ScoringModel, StrategyKind};
use super::rules::RuleScorer;
use super::store::{ModelStore, StorageError};

/// Controls when the learned strategy replaces the rule-based one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrainingSettings {
    /// Approved plus rejected records required before a forest is trained.
    pub min_decided_records: usize,
    pub forest: ForestSettings,
}

impl Default for TrainingSettings {
    fn default() -> Self {
        Self {
            min_decided_records: 10,
            forest: ForestSettings::default(),
        }
    }
}

/// Context object carrying the strategy chosen for this process.
#[derive(Debug, Clone)]
pub struct ActiveScorer {
    artifact: Arc<ModelArtifact>,
}

impl ActiveScorer {
    pub fn new(artifact: ModelArtifact) -> Self {
        Self {
            artifact: Arc::new(artifact),
        }
    }

    pub fn artifact(&self) -> &ModelArtifact {
        &self.artifact
    }

    pub fn strategy(&self) -> StrategyKind {
        self.artifact.model.kind()
    }

    pub fn probability(&self, features: &ApplicationFeatures) -> f64 {
        self.artifact.model.approval_probability(features)
    }

    pub fn score(&self, features: &ApplicationFeatures) -> u8 {
        self.artifact.model.score(features)
    }

    pub fn explain(&self, features: &ApplicationFeatures) -> Explanation {
        explain(features)
    }
}

/// Load-or-train step run before the first score in a process.
///
/// A persisted artifact always wins; the history is only consulted when
/// nothing has been stored yet. There is no retraining once an artifact
/// exists.
pub struct ModelLifecycle<S, H> {
    store: S,
    history: H,
    settings: TrainingSettings,
}

impl<S, H> ModelLifecycle<S, H>
where
    S: ModelStore,
    H: HistorySource,
{
    pub fn new(store: S, history: H, settings: TrainingSettings) -> Self {
        Self {
            store,
            history,
            settings,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn ensure_scorer_ready(&self) -> Result<ActiveScorer, StorageError> {
        if let Some(artifact) = self.store.load()? {
            info!(
                strategy = %artifact.model.kind(),
                training_records = artifact.training_records,
                "loaded persisted scoring model"
            );
            return Ok(ActiveScorer::new(artifact));
        }

        let records = self.history.records()?;
        let artifact = select_strategy(&records, &self.settings);
        self.store.save(&artifact)?;

        info!(
            strategy = %artifact.model.kind(),
            training_records = artifact.training_records,
            "persisted new scoring model"
        );
        Ok(ActiveScorer::new(artifact))
    }
}

/// Chooses and fits the strategy for a history snapshot. Pending records are ignored.
pub fn select_strategy(records: &[HistoricalRecord], settings: &TrainingSettings) -> ModelArtifact {
    let decided: Vec<&HistoricalRecord> = records.iter().filter(|r| r.is_terminal()).collect();

    if decided.is_empty() || decided.len() < settings.min_decided_records {
        debug!(
            decided = decided.len(),
            required = settings.min_decided_records,
            "not enough decided applications, using rule-based scoring"
        );
        return ModelArtifact::new(
            ScoringModel::RuleBased(RuleScorer::default()),
            decided.len(),
        );
    }

    let rows: Vec<FeatureRow> = decided
        .iter()
        .map(|record| record.features.as_vector())
        .collect();
    let labels: Vec<bool> = decided.iter().map(|record| record.approved()).collect();
    let forest = RandomForest::fit(&rows, &labels, &settings.forest);

    debug!(
        decided = decided.len(),
        trees = forest.tree_count(),
        "trained random forest scoring model"
    );
    ModelArtifact::new(ScoringModel::RandomForest(forest), decided.len())
}

/// Single-flight guard around [`ModelLifecycle`] for concurrent callers.
///
/// The first caller loads or trains while holding the lock; everyone after
/// reuses the cached scorer. A failed attempt caches nothing.
pub struct ScorerCell<S, H> {
    lifecycle: ModelLifecycle<S, H>,
    active: Mutex<Option<ActiveScorer>>,
}

impl<S, H> ScorerCell<S, H>
where
    S: ModelStore,
    H: HistorySource,
{
    pub fn new(lifecycle: ModelLifecycle<S, H>) -> Self {
        Self {
            lifecycle,
            active: Mutex::new(None),
        }
    }

    pub fn lifecycle(&self) -> &ModelLifecycle<S, H> {
        &self.lifecycle
    }

    /// True once a scorer is cached. A load or training run in progress reports false.
    pub fn is_ready(&self) -> bool {
        match self.active.try_lock() {
            Ok(guard) => guard.is_some(),
            Err(_) => false,
        }
    }

    pub fn get(&self) -> Result<ActiveScorer, StorageError> {
        let mut guard = self
            .active
            .lock()
            .map_err(|_| StorageError::Unavailable("scorer lock poisoned".to_string()))?;

        if let Some(active) = guard.as_ref() {
            return Ok(active.clone());
        }

        let active = self.lifecycle.ensure_scorer_ready()?;
        *guard = Some(active.clone());
        Ok(active)
    }
}
