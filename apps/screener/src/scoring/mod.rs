//! Resume scoring — the seam between the processing pipeline and whatever rates candidates.
//!
//! Default backend: `LlmResumeScorer` (one model call per resume through `llm_client`).
//! `AppState` holds an `Arc<dyn ResumeScorer>` so tests can plug in a deterministic scorer.

pub mod llm;
pub mod prompts;
#[cfg(test)]
pub mod testing;

use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::llm_client::LlmError;

/// Scores at or above this count as qualified candidates.
pub const QUALIFIED_THRESHOLD: f64 = 80.0;

/// Marker recorded when a resume could not be scored.
pub const UNSCORED: &str = "N/A";

/// A candidate's score. Usually numeric; a text marker when scoring was impossible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Score {
    Numeric(f64),
    Text(String),
}

impl Score {
    pub fn unscored() -> Self {
        Score::Text(UNSCORED.to_string())
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Score::Numeric(n) if n.is_finite() => Some(*n),
            _ => None,
        }
    }

    /// Value used only for ranking; anything non-numeric ranks as zero.
    pub fn rank_value(&self) -> f64 {
        self.as_number().unwrap_or(0.0)
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Score::Numeric(n) if n.fract() == 0.0 => write!(f, "{n:.0}"),
            Score::Numeric(n) => write!(f, "{n:.1}"),
            Score::Text(s) => f.write_str(s),
        }
    }
}

/// Cosmetic markers shown next to a score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Markers {
    pub emoji: String,
    pub color: String,
    pub label: String,
}

impl Markers {
    fn new(emoji: &str, color: &str, label: &str) -> Self {
        Self {
            emoji: emoji.to_string(),
            color: color.to_string(),
            label: label.to_string(),
        }
    }

    pub fn for_score(score: f64) -> Self {
        match score {
            s if s >= QUALIFIED_THRESHOLD => Self::new("🟢", "green", "Strong Match"),
            s if s >= 60.0 => Self::new("🟡", "yellow", "Good Match"),
            s if s >= 40.0 => Self::new("🟠", "orange", "Partial Match"),
            _ => Self::new("🔴", "red", "Weak Match"),
        }
    }

    pub fn unscored(label: &str) -> Self {
        Self::new("⚪", "gray", label)
    }
}

/// What a scorer reports for one resume.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredResume {
    pub filename: String,
    pub score: Score,
    pub markers: Markers,
    pub match_reasons: Vec<String>,
    pub website: Option<String>,
    pub red_flags: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("Scoring API credentials are not configured (set ANTHROPIC_API_KEY)")]
    MissingCredentials,

    #[error("Scoring API error: {0}")]
    Llm(#[from] LlmError),

    #[error("Scoring was cancelled")]
    Cancelled,

    #[error("Could not build scoring prompt: {0}")]
    Prompt(#[from] askama::Error),
}

/// The resume scorer trait. Implement this to swap backends without touching the
/// upload handler or the processing pipeline.
#[async_trait]
pub trait ResumeScorer: Send + Sync {
    /// Short backend name for logs.
    fn backend(&self) -> &'static str;

    /// Validates credentials and builds clients. Called once per session before scoring.
    async fn prepare(&self) -> Result<(), ScoringError> {
        Ok(())
    }

    /// Scores every resume against the job description, returning one entry per path in
    /// input order. `progress` is called with `(finished, total)` after each resume.
    /// Must stop early with `ScoringError::Cancelled` once `cancel` fires.
    async fn score_all(
        &self,
        job_description: &str,
        resumes: &[PathBuf],
        cancel: &CancellationToken,
        progress: &(dyn Fn(usize, usize) + Send + Sync),
    ) -> Result<Vec<ScoredResume>, ScoringError>;
}

/// Display name for a resume path: its file name, or the whole path if it has none.
pub fn display_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
