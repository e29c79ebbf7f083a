//! Session status tracker — process-lifetime map from session id to status record.
//!
//! Every write is a compare-and-set under the entry's shard lock: it only applies while the
//! record is still `processing`. Readers get a cloned snapshot, never a half-written record.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::screening::report::ResultsPayload;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Processing,
    Completed,
    Error,
    NotFound,
}

impl SessionStatus {
    #[cfg(test)]
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Error)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub status: SessionStatus,
    pub progress: u8,
    pub stage: String,
    pub results: Option<ResultsPayload>,
    pub error: Option<String>,
}

impl StatusRecord {
    fn started() -> Self {
        Self {
            status: SessionStatus::Processing,
            progress: 0,
            stage: "Initializing...".to_string(),
            results: None,
            error: None,
        }
    }
}

/// What a status lookup returns. Unknown ids serialize as `{"status": "not_found"}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StatusSnapshot {
    Known(StatusRecord),
    Missing { status: SessionStatus },
}

impl StatusSnapshot {
    pub fn status(&self) -> SessionStatus {
        match self {
            StatusSnapshot::Known(record) => record.status,
            StatusSnapshot::Missing { status } => *status,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StatusTracker {
    records: Arc<DashMap<Uuid, StatusRecord>>,
}

impl StatusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a fresh `processing` record. Returns false if the id is already tracked.
    pub fn start(&self, id: Uuid) -> bool {
        match self.records.entry(id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(StatusRecord::started());
                true
            }
        }
    }

    /// No-op for unknown or finished sessions.
    pub fn update_progress(&self, id: Uuid, progress: u8, stage: impl Into<String>) -> bool {
        let stage = stage.into();
        self.transition(id, |record| {
            record.progress = progress.min(100);
            record.stage = stage;
        })
    }

    pub fn complete(&self, id: Uuid, results: ResultsPayload) -> bool {
        self.transition(id, |record| {
            record.status = SessionStatus::Completed;
            record.progress = 100;
            record.stage = "Completed".to_string();
            record.results = Some(results);
        })
    }

    pub fn fail(&self, id: Uuid, error: impl Into<String>) -> bool {
        let error = error.into();
        self.transition(id, |record| {
            record.status = SessionStatus::Error;
            record.error = Some(error);
        })
    }

    pub fn get(&self, id: &Uuid) -> StatusSnapshot {
        match self.records.get(id) {
            Some(record) => StatusSnapshot::Known(record.value().clone()),
            None => StatusSnapshot::Missing {
                status: SessionStatus::NotFound,
            },
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Applies `apply` only while the record is still processing.
    fn transition<F>(&self, id: Uuid, apply: F) -> bool
    where
        F: FnOnce(&mut StatusRecord),
    {
        match self.records.get_mut(&id) {
            Some(mut record) if record.status == SessionStatus::Processing => {
                apply(record.value_mut());
                true
            }
            _ => false,
        }
    }
}
