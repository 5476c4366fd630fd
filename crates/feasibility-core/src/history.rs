//! Saved assessments.
//!
//! Records are kept newest first. Saving an existing id replaces the record
//! in place; a new id goes to the front.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::types::{AssessmentResult, Answers};

/// A named, persisted assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedAssessment {
    pub id: String,
    pub name: String,
    pub date: DateTime<Utc>,
    pub answers: Answers,
    pub result: AssessmentResult,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to access assessment store: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode assessments: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Storage for saved assessments.
pub trait AssessmentStore {
    /// All records, newest first.
    fn load_all(&self) -> Result<Vec<SavedAssessment>, StoreError>;

    /// Insert or replace by id.
    fn save(&mut self, record: &SavedAssessment) -> Result<(), StoreError>;

    /// Remove by id, returning whether anything was removed.
    fn delete(&mut self, id: &str) -> Result<bool, StoreError>;

    fn get(&self, id: &str) -> Result<Option<SavedAssessment>, StoreError> {
        Ok(self.load_all()?.into_iter().find(|record| record.id == id))
    }
}

fn upsert(records: &mut Vec<SavedAssessment>, record: &SavedAssessment) {
    match records.iter_mut().find(|existing| existing.id == record.id) {
        Some(existing) => *existing = record.clone(),
        None => records.insert(0, record.clone()),
    }
}

/// In-process store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Vec<SavedAssessment>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AssessmentStore for MemoryStore {
    fn load_all(&self) -> Result<Vec<SavedAssessment>, StoreError> {
        Ok(self.records.clone())
    }

    fn save(&mut self, record: &SavedAssessment) -> Result<(), StoreError> {
        upsert(&mut self.records, record);
        Ok(())
    }

    fn delete(&mut self, id: &str) -> Result<bool, StoreError> {
        let before = self.records.len();
        self.records.retain(|record| record.id != id);
        Ok(self.records.len() != before)
    }
}

/// Store backed by a single JSON array on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_all(&self, records: &[SavedAssessment]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(records)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;

        tracing::debug!(path = %self.path.display(), records = records.len(), "Assessment store written");
        Ok(())
    }
}

impl AssessmentStore for JsonFileStore {
    /// A missing file is an empty store. A file that cannot be decoded is
    /// logged and also treated as empty; the next save overwrites it.
    fn load_all(&self) -> Result<Vec<SavedAssessment>, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        match serde_json::from_str(&contents) {
            Ok(records) => Ok(records),
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "Discarding unreadable assessment history"
                );
                Ok(Vec::new())
            }
        }
    }

    fn save(&mut self, record: &SavedAssessment) -> Result<(), StoreError> {
        let mut records = self.load_all()?;
        upsert(&mut records, record);
        self.write_all(&records)
    }

    fn delete(&mut self, id: &str) -> Result<bool, StoreError> {
        let mut records = self.load_all()?;
        let before = records.len();
        records.retain(|record| record.id != id);
        if records.len() == before {
            return Ok(false);
        }
        self.write_all(&records)?;
        Ok(true)
    }
}
