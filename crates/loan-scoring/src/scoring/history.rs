use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::features::{extract, ApplicationFeatures, RawApplication};
use super::store::StorageError;

/// Officer decision recorded against a past application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStatus {
    Pending,
    Approved,
    Rejected,
}

impl DecisionStatus {
    /// Only the exact lowercase `approved`/`rejected` values count as decisions.
    /// Anything else, including other casings, is treated as still pending.
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "approved" => Self::Approved,
            "rejected" => Self::Rejected,
            _ => Self::Pending,
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

/// Past application used as training data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRecord {
    pub features: ApplicationFeatures,
    pub status: DecisionStatus,
}

impl HistoricalRecord {
    pub fn new(features: ApplicationFeatures, status: DecisionStatus) -> Self {
        Self { features, status }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn approved(&self) -> bool {
        self.status == DecisionStatus::Approved
    }
}

/// Read-only access to past decisions.
pub trait HistorySource: Send + Sync {
    fn records(&self) -> Result<Vec<HistoricalRecord>, StorageError>;
}

impl HistorySource for Vec<HistoricalRecord> {
    fn records(&self) -> Result<Vec<HistoricalRecord>, StorageError> {
        Ok(self.clone())
    }
}

/// Loan application export with a header row and a `status` column.
#[derive(Debug, Clone)]
pub struct CsvHistory {
    path: PathBuf,
}

impl CsvHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HistorySource for CsvHistory {
    fn records(&self) -> Result<Vec<HistoricalRecord>, StorageError> {
        let file = match std::fs::File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no application history yet");
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(StorageError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        parse_history(file).map_err(|source| StorageError::History {
            path: self.path.clone(),
            source,
        })
    }
}

/// Parses an application export. Feature cells use the same loose coercion as intake.
pub fn parse_history<R: Read>(reader: R) -> Result<Vec<HistoricalRecord>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let mut records = Vec::new();

    for row in csv_reader.records() {
        let row = row?;
        let mut raw = RawApplication::new();
        let mut status = DecisionStatus::Pending;

        for (header, cell) in headers.iter().zip(row.iter()) {
            if header == "status" {
                status = DecisionStatus::parse(cell);
            } else {
                raw.insert(header.to_string(), Value::String(cell.to_string()));
            }
        }

        records.push(HistoricalRecord::new(extract(&raw), status));
    }

    Ok(records)
}
