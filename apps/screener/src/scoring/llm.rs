//! LLM resume scorer: one Messages API call per readable resume.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use futures::{stream, StreamExt, TryStreamExt};
use serde::Deserialize;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::ingest::extract::extract_text_blocking;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::LlmClient;
use crate::scoring::prompts::{build_scoring_prompt, SCORING_SYSTEM};
use crate::scoring::{display_name, Markers, ResumeScorer, Score, ScoredResume, ScoringError};

/// Shape the model is asked to return for each resume.
#[derive(Debug, Deserialize)]
struct Assessment {
    score: f64,
    #[serde(default)]
    match_reasons: Vec<String>,
    #[serde(default)]
    website: Option<String>,
    #[serde(default)]
    red_flags: Vec<String>,
}

impl Assessment {
    fn into_scored(self, filename: String) -> ScoredResume {
        let score = if self.score.is_finite() {
            self.score.clamp(0.0, 100.0)
        } else {
            0.0
        };
        ScoredResume {
            filename,
            score: Score::Numeric(score),
            markers: Markers::for_score(score),
            match_reasons: self.match_reasons,
            website: self.website.filter(|w| !w.trim().is_empty()),
            red_flags: self.red_flags,
        }
    }
}

fn unscored(filename: String, label: &str, flag: String) -> ScoredResume {
    ScoredResume {
        filename,
        score: Score::unscored(),
        markers: Markers::unscored(label),
        match_reasons: Vec::new(),
        website: None,
        red_flags: vec![flag],
    }
}

/// Default scorer backed by the Anthropic API. The HTTP client is built lazily by
/// `prepare`, so a missing key only fails the sessions that need it.
pub struct LlmResumeScorer {
    api_key: Option<String>,
    model: String,
    concurrency: usize,
    client: OnceCell<LlmClient>,
}

impl LlmResumeScorer {
    pub fn new(api_key: Option<String>, model: String, concurrency: usize) -> Self {
        Self {
            api_key,
            model,
            concurrency: concurrency.max(1),
            client: OnceCell::new(),
        }
    }

    async fn client(&self) -> Result<&LlmClient, ScoringError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or(ScoringError::MissingCredentials)?;
        self.client
            .get_or_try_init(|| async {
                let client = LlmClient::new(api_key.clone(), self.model.clone())?;
                info!("LLM scoring client initialized (model: {})", client.model());
                Ok::<_, ScoringError>(client)
            })
            .await
    }
}

#[async_trait]
impl ResumeScorer for LlmResumeScorer {
    fn backend(&self) -> &'static str {
        "llm"
    }

    async fn prepare(&self) -> Result<(), ScoringError> {
        self.client().await.map(|_| ())
    }

    async fn score_all(
        &self,
        job_description: &str,
        resumes: &[PathBuf],
        cancel: &CancellationToken,
        progress: &(dyn Fn(usize, usize) + Send + Sync),
    ) -> Result<Vec<ScoredResume>, ScoringError> {
        let client = self.client().await?;
        let system = format!("{SCORING_SYSTEM} {JSON_ONLY_SYSTEM}");
        let total = resumes.len();
        let finished = AtomicUsize::new(0);

        let system = system.as_str();
        let finished = &finished;
        let jobs: Vec<_> = resumes
            .iter()
            .map(|path| async move {
                let outcome = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(ScoringError::Cancelled),
                    scored = score_resume(client, system, job_description, path) => scored,
                };
                let done = finished.fetch_add(1, Ordering::SeqCst) + 1;
                progress(done, total);
                outcome
            })
            .collect();

        stream::iter(jobs)
            .buffered(self.concurrency)
            .try_collect()
            .await
    }
}

async fn score_resume(
    client: &LlmClient,
    system: &str,
    job_description: &str,
    path: &Path,
) -> Result<ScoredResume, ScoringError> {
    let filename = display_name(path);
    let text = extract_text_blocking(path.to_path_buf()).await;
    if text.trim().is_empty() {
        warn!("No text extracted from resume {filename}");
        return Ok(unscored(
            filename,
            "Unreadable",
            "Could not extract text from resume".to_string(),
        ));
    }

    let prompt = build_scoring_prompt(job_description, &filename, &text)?;
    match client.call_json::<Assessment>(&prompt, system).await {
        Ok(assessment) => {
            debug!("Scored {filename}: {}", assessment.score);
            Ok(assessment.into_scored(filename))
        }
        Err(e) if e.is_auth_failure() => Err(ScoringError::Llm(e)),
        Err(e) => {
            warn!("Scoring failed for {filename}: {e}");
            Ok(unscored(filename, "Scoring Failed", format!("Scoring failed: {e}")))
        }
    }
}
