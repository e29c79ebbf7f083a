//! Deterministic scorers for tests.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::llm_client::LlmError;
use crate::scoring::{display_name, Markers, ResumeScorer, Score, ScoredResume, ScoringError};

pub enum Behavior {
    /// Scores each resume from this table by file name; unknown names get "N/A".
    Table(Vec<(&'static str, Score)>),
    /// Every resume gets the same score.
    Uniform(f64),
    Fail(&'static str),
    FailPrepare,
    /// Waits for cancellation, recording that it saw it.
    Hang,
    /// Blocks until a permit is added to the gate, then scores uniformly.
    Gated(Arc<Semaphore>, f64),
    Panic,
}

pub struct FakeScorer {
    behavior: Behavior,
    pub saw_cancel: Arc<AtomicBool>,
}

impl FakeScorer {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            saw_cancel: Arc::new(AtomicBool::new(false)),
        }
    }
}

fn scored(path: &Path, score: Score) -> ScoredResume {
    let markers = match score.as_number() {
        Some(n) => Markers::for_score(n),
        None => Markers::unscored("Unreadable"),
    };
    ScoredResume {
        filename: display_name(path),
        score,
        markers,
        match_reasons: vec!["Relevant experience".to_string()],
        website: None,
        red_flags: vec![],
    }
}

#[async_trait]
impl ResumeScorer for FakeScorer {
    fn backend(&self) -> &'static str {
        "fake"
    }

    async fn prepare(&self) -> Result<(), ScoringError> {
        match self.behavior {
            Behavior::FailPrepare => Err(ScoringError::MissingCredentials),
            _ => Ok(()),
        }
    }

    async fn score_all(
        &self,
        _job_description: &str,
        resumes: &[PathBuf],
        cancel: &CancellationToken,
        progress: &(dyn Fn(usize, usize) + Send + Sync),
    ) -> Result<Vec<ScoredResume>, ScoringError> {
        let uniform = |score: f64| {
            resumes
                .iter()
                .enumerate()
                .map(|(i, path)| {
                    progress(i + 1, resumes.len());
                    scored(path, Score::Numeric(score))
                })
                .collect::<Vec<_>>()
        };

        match &self.behavior {
            Behavior::Table(table) => Ok(resumes
                .iter()
                .map(|path| {
                    let name = display_name(path);
                    let score = table
                        .iter()
                        .find(|(n, _)| *n == name)
                        .map(|(_, s)| s.clone())
                        .unwrap_or_else(Score::unscored);
                    scored(path, score)
                })
                .collect()),
            Behavior::Uniform(score) => Ok(uniform(*score)),
            Behavior::Fail(msg) => Err(ScoringError::Llm(LlmError::Api {
                status: 500,
                message: msg.to_string(),
            })),
            Behavior::FailPrepare => Ok(vec![]),
            Behavior::Hang => {
                cancel.cancelled().await;
                self.saw_cancel.store(true, Ordering::SeqCst);
                Err(ScoringError::Cancelled)
            }
            Behavior::Gated(gate, score) => {
                let _permit = gate.acquire().await.expect("gate closed");
                Ok(uniform(*score))
            }
            Behavior::Panic => panic!("scorer exploded"),
        }
    }
}
