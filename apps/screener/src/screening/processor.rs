//! Background processor — runs one scoring job per session off the request path.
//!
//! Sessions are tokio tasks gated by a semaphore. Each gets a cancellation token derived
//! from the process shutdown token; the timeout cancels it and drops the in-flight scoring
//! future, which aborts any outstanding model calls.

use std::any::Any;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::scoring::{ResumeScorer, ScoringError};
use crate::screening::report::{rank, CandidateRecord, ResultsPayload};
use crate::screening::session::Session;
use crate::screening::tracker::StatusTracker;

const SCORING_START: u8 = 20;
const REPORT_STAGE: u8 = 90;

#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("{0}")]
    Scoring(#[from] ScoringError),

    #[error("Processing timeout - please try with fewer resumes")]
    Timeout,

    #[error("Processing cancelled: server shutting down")]
    Shutdown,
}

#[derive(Debug, Clone)]
pub struct ProcessorSettings {
    pub max_concurrent_sessions: usize,
    pub timeout: Duration,
    /// Leave session directories on disk after a terminal transition.
    pub keep_files: bool,
}

#[derive(Clone)]
pub struct Processor {
    tracker: StatusTracker,
    scorer: Arc<dyn ResumeScorer>,
    slots: Arc<Semaphore>,
    shutdown: CancellationToken,
    timeout: Duration,
    keep_files: bool,
}

impl Processor {
    pub fn new(
        tracker: StatusTracker,
        scorer: Arc<dyn ResumeScorer>,
        settings: ProcessorSettings,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            tracker,
            scorer,
            slots: Arc::new(Semaphore::new(settings.max_concurrent_sessions.max(1))),
            shutdown,
            timeout: settings.timeout,
            keep_files: settings.keep_files,
        }
    }

    /// Schedules processing for a session already started in the tracker and returns
    /// immediately. The session always ends in a terminal state, even if the job panics.
    pub fn spawn(&self, session: Arc<Session>) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            let id = session.id;
            let worker = {
                let this = this.clone();
                let session = Arc::clone(&session);
                tokio::spawn(async move { this.run(&session).await })
            };

            if let Err(e) = worker.await {
                error!(session_id = %id, "Processing task aborted: {e}");
                this.tracker
                    .fail(id, format!("Processing failed: {}", describe_join_error(e)));
            }

            if !this.keep_files {
                remove_workdir(&session.workdir).await;
            }
        })
    }

    async fn run(&self, session: &Session) {
        let id = session.id;

        let _slot = tokio::select! {
            slot = Arc::clone(&self.slots).acquire_owned() => match slot {
                Ok(slot) => slot,
                Err(e) => {
                    self.tracker.fail(id, format!("Processing failed: {e}"));
                    return;
                }
            },
            _ = self.shutdown.cancelled() => {
                self.tracker.fail(id, ProcessingError::Shutdown.to_string());
                return;
            }
        };

        info!(
            session_id = %id,
            resumes = session.resume_count(),
            backend = self.scorer.backend(),
            "Processing started"
        );

        match self.process(session).await {
            Ok(results) => {
                let top = results.statistics.top_score;
                if self.tracker.complete(id, results) {
                    let elapsed = Utc::now() - session.created_at;
                    info!(
                        session_id = %id,
                        top_score = top,
                        elapsed_ms = elapsed.num_milliseconds(),
                        "Processing completed"
                    );
                }
            }
            Err(e) => {
                error!(session_id = %id, "Error in async processing: {e}");
                self.tracker.fail(id, e.to_string());
            }
        }
    }

    async fn process(&self, session: &Session) -> Result<ResultsPayload, ProcessingError> {
        let id = session.id;

        self.tracker.update_progress(id, 10, "Initializing AI API...");
        self.scorer.prepare().await?;

        self.tracker
            .update_progress(id, SCORING_START, "Processing resumes...");

        let cancel = self.shutdown.child_token();
        let tracker = self.tracker.clone();
        let progress = move |done: usize, total: usize| {
            tracker.update_progress(
                id,
                scoring_progress(done, total),
                format!("Processing resumes... ({done}/{total})"),
            );
        };

        let scoring = self.scorer.score_all(
            &session.job.description,
            &session.resume_files,
            &cancel,
            &progress,
        );

        let results = match tokio::time::timeout(self.timeout, scoring).await {
            Ok(Ok(results)) => results,
            Ok(Err(_)) if self.shutdown.is_cancelled() => return Err(ProcessingError::Shutdown),
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => {
                cancel.cancel();
                warn!(
                    session_id = %id,
                    "Processing timeout after {}s",
                    self.timeout.as_secs()
                );
                return Err(ProcessingError::Timeout);
            }
        };

        let ranked = rank(results);

        self.tracker
            .update_progress(id, REPORT_STAGE, "Generating final report...");

        let candidates = ranked.into_iter().map(CandidateRecord::from).collect();
        Ok(ResultsPayload::new(candidates, Utc::now()))
    }
}

/// Maps finished resumes onto the 20–90% band reserved for scoring.
fn scoring_progress(done: usize, total: usize) -> u8 {
    if total == 0 {
        return SCORING_START;
    }
    let span = (REPORT_STAGE - SCORING_START) as usize;
    let advanced = span * done.min(total) / total;
    SCORING_START + advanced as u8
}

fn describe_join_error(err: JoinError) -> String {
    if err.is_panic() {
        panic_message(err.into_panic())
    } else {
        "processing task was cancelled".to_string()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(msg) => *msg,
        Err(payload) => payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unknown panic".to_string()),
    }
}

async fn remove_workdir(dir: &Path) {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove session directory {}: {e}", dir.display()),
    }
}
