use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::response::Response;
use serde_json::Value;

use crate::scoring::{
    ApplicationFeatures, DecisionStatus, HistoricalRecord, HistorySource, ModelArtifact,
    ModelStore, StorageError,
};

pub(super) fn features(
    loan_amount: f64,
    loan_term: i64,
    annual_income: f64,
    employment_length: i64,
    credit_score: i64,
    monthly_debt: f64,
) -> ApplicationFeatures {
    ApplicationFeatures {
        loan_amount,
        loan_term,
        annual_income,
        employment_length,
        credit_score,
        monthly_debt,
    }
}

/// 10k over 3 years on 50k income, 700 credit, 1k monthly debt.
pub(super) fn reference_features() -> ApplicationFeatures {
    features(10_000.0, 3, 50_000.0, 1, 700, 1_000.0)
}

pub(super) fn approved_record(offset: usize) -> HistoricalRecord {
    HistoricalRecord::new(
        features(15_000.0, 5, 80_000.0 + offset as f64 * 1_000.0, 4, 720 + offset as i64 * 8, 500.0),
        DecisionStatus::Approved,
    )
}

pub(super) fn rejected_record(offset: usize) -> HistoricalRecord {
    HistoricalRecord::new(
        features(15_000.0, 5, 30_000.0 + offset as f64 * 500.0, 4, 500 + offset as i64 * 8, 2_000.0),
        DecisionStatus::Rejected,
    )
}

pub(super) fn pending_record() -> HistoricalRecord {
    HistoricalRecord::new(reference_features(), DecisionStatus::Pending)
}

/// `decided` terminal records alternating approved/rejected, plus a few pending ones.
pub(super) fn history_with_decisions(decided: usize) -> Vec<HistoricalRecord> {
    let mut records: Vec<HistoricalRecord> = (0..decided)
        .map(|index| {
            if index % 2 == 0 {
                approved_record(index / 2)
            } else {
                rejected_record(index / 2)
            }
        })
        .collect();
    records.extend((0..3).map(|_| pending_record()));
    records
}

pub(super) fn scratch_dir(label: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock after epoch")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "loan-scoring-{label}-{}-{nanos}",
        std::process::id()
    ));
    std::fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// History source that counts how often it is consulted.
#[derive(Clone)]
pub(super) struct CountingHistory {
    pub(super) records: Vec<HistoricalRecord>,
    pub(super) calls: Arc<AtomicUsize>,
}

impl CountingHistory {
    pub(super) fn new(records: Vec<HistoricalRecord>) -> Self {
        Self {
            records,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl HistorySource for CountingHistory {
    fn records(&self) -> Result<Vec<HistoricalRecord>, StorageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.records.clone())
    }
}

pub(super) struct UnreadableStore;

impl ModelStore for UnreadableStore {
    fn load(&self) -> Result<Option<ModelArtifact>, StorageError> {
        Err(StorageError::Unavailable("disk offline".to_string()))
    }

    fn save(&self, _artifact: &ModelArtifact) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("disk offline".to_string()))
    }
}

pub(super) struct ReadOnlyStore;

impl ModelStore for ReadOnlyStore {
    fn load(&self) -> Result<Option<ModelArtifact>, StorageError> {
        Ok(None)
    }

    fn save(&self, _artifact: &ModelArtifact) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("read only".to_string()))
    }
}

/// Fails the first load, then behaves like an empty store.
#[derive(Default)]
pub(super) struct FlakyStore {
    tripped: AtomicBool,
}

impl ModelStore for FlakyStore {
    fn load(&self) -> Result<Option<ModelArtifact>, StorageError> {
        if self.tripped.swap(true, Ordering::SeqCst) {
            Ok(None)
        } else {
            Err(StorageError::Unavailable("warming up".to_string()))
        }
    }

    fn save(&self, _artifact: &ModelArtifact) -> Result<(), StorageError> {
        Ok(())
    }
}
