use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use crate::screening::job_details::JobRecord;

/// One upload-to-results lifecycle.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub job: JobRecord,
    pub resume_files: Vec<PathBuf>,
    /// Per-session staging directory holding the job file and resumes.
    pub workdir: PathBuf,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn resume_count(&self) -> usize {
        self.resume_files.len()
    }
}

/// Session metadata kept for the lifetime of the process; the results page reads the
/// job record from here.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<DashMap<Uuid, Arc<Session>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, session: Session) -> Arc<Session> {
        let session = Arc::new(session);
        self.sessions.insert(session.id, Arc::clone(&session));
        session
    }

    pub fn get(&self, id: &Uuid) -> Option<Arc<Session>> {
        self.sessions.get(id).map(|s| Arc::clone(s.value()))
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }
}
