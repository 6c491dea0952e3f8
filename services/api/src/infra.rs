use loan_scoring::config::ScoringConfig;
use loan_scoring::scoring::{
    CsvHistory, FileModelStore, HistorySource, LoanScoringService, ModelLifecycle, ModelStore,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub(crate) type FileScoringService = LoanScoringService<FileModelStore, CsvHistory>;

/// Reports whether scoring can answer without first loading or training a model.
pub(crate) trait ScoringReadiness: Send + Sync {
    fn scoring_ready(&self) -> bool;
}

impl<S, H> ScoringReadiness for LoanScoringService<S, H>
where
    S: ModelStore,
    H: HistorySource,
{
    fn scoring_ready(&self) -> bool {
        self.is_ready()
    }
}

#[derive(Clone)]
pub(crate) struct AppState {
    /// Set once the listener is bound.
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) scoring: Arc<dyn ScoringReadiness>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn build_scoring_service(config: &ScoringConfig) -> FileScoringService {
    LoanScoringService::new(ModelLifecycle::new(
        FileModelStore::new(&config.model_path),
        CsvHistory::new(&config.history_path),
        config.training,
    ))
}
