//! Ranking and summary statistics over scorer output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scoring::{Score, ScoredResume, QUALIFIED_THRESHOLD};

/// One ranked candidate as served to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub filename: String,
    pub score: Score,
    pub emoji: String,
    pub color: String,
    pub label: String,
    pub match_reasons: Vec<String>,
    pub website: Option<String>,
    pub red_flags: Vec<String>,
}

impl From<ScoredResume> for CandidateRecord {
    fn from(scored: ScoredResume) -> Self {
        Self {
            filename: scored.filename,
            score: scored.score,
            emoji: scored.markers.emoji,
            color: scored.markers.color,
            label: scored.markers.label,
            match_reasons: scored.match_reasons,
            website: scored.website,
            red_flags: scored.red_flags,
        }
    }
}

/// Aggregates over numeric scores only; all zero when none are numeric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_candidates: usize,
    pub top_score: f64,
    pub average_score: f64,
    pub qualified_candidates: usize,
}

/// Final payload attached to a completed session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsPayload {
    pub candidates: Vec<CandidateRecord>,
    pub statistics: Statistics,
    pub timestamp: DateTime<Utc>,
}

impl ResultsPayload {
    pub fn new(candidates: Vec<CandidateRecord>, timestamp: DateTime<Utc>) -> Self {
        let statistics = summarize(&candidates);
        Self {
            candidates,
            statistics,
            timestamp,
        }
    }
}

/// Orders results by score, highest first. Non-numeric scores rank as zero but are left
/// untouched; ties keep scorer order.
pub fn rank(mut results: Vec<ScoredResume>) -> Vec<ScoredResume> {
    results.sort_by(|a, b| b.score.rank_value().total_cmp(&a.score.rank_value()));
    results
}

pub fn summarize(candidates: &[CandidateRecord]) -> Statistics {
    let scores: Vec<f64> = candidates.iter().filter_map(|c| c.score.as_number()).collect();

    let top_score = scores.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let average_score = if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    };

    Statistics {
        total_candidates: candidates.len(),
        top_score,
        average_score,
        qualified_candidates: scores.iter().filter(|s| **s >= QUALIFIED_THRESHOLD).count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::Markers;

    fn scored(filename: &str, score: Score) -> ScoredResume {
        let markers = match score.as_number() {
            Some(n) => Markers::for_score(n),
            None => Markers::unscored("Unreadable"),
        };
        ScoredResume {
            filename: filename.to_string(),
            score,
            markers,
            match_reasons: vec![format!("{filename} reason")],
            website: None,
            red_flags: vec![],
        }
    }

    #[test]
    fn test_rank_and_summarize_mixed_scores() {
        let results = vec![
            scored("c.pdf", Score::unscored()),
            scored("b.pdf", Score::Numeric(55.0)),
            scored("a.pdf", Score::Numeric(92.0)),
        ];

        let candidates: Vec<CandidateRecord> =
            rank(results).into_iter().map(CandidateRecord::from).collect();
        let order: Vec<&str> = candidates.iter().map(|c| c.filename.as_str()).collect();
        assert_eq!(order, ["a.pdf", "b.pdf", "c.pdf"]);

        // the text score survives ranking untouched
        assert_eq!(candidates[2].score, Score::unscored());

        let stats = summarize(&candidates);
        assert_eq!(stats.total_candidates, 3);
        assert_eq!(stats.top_score, 92.0);
        assert_eq!(stats.qualified_candidates, 1);
        assert!((stats.average_score - 73.5).abs() < 1e-9);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let results = vec![
            scored("first.pdf", Score::Numeric(70.0)),
            scored("unscored.pdf", Score::unscored()),
            scored("second.pdf", Score::Numeric(70.0)),
            scored("zero.pdf", Score::Numeric(0.0)),
        ];
        let order: Vec<String> = rank(results).into_iter().map(|r| r.filename).collect();
        assert_eq!(order, ["first.pdf", "second.pdf", "unscored.pdf", "zero.pdf"]);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let candidates: Vec<CandidateRecord> = [80.0, 79.99, 100.0]
            .iter()
            .map(|s| CandidateRecord::from(scored("x.pdf", Score::Numeric(*s))))
            .collect();
        assert_eq!(summarize(&candidates).qualified_candidates, 2);
    }

    #[test]
    fn test_no_numeric_scores_yields_zeroes() {
        let candidates = vec![CandidateRecord::from(scored("x.pdf", Score::unscored()))];
        let stats = summarize(&candidates);
        assert_eq!(stats.total_candidates, 1);
        assert_eq!(stats.top_score, 0.0);
        assert_eq!(stats.average_score, 0.0);
        assert_eq!(stats.qualified_candidates, 0);
    }

    #[test]
    fn test_candidate_record_flattens_markers() {
        let record = CandidateRecord::from(scored("a.pdf", Score::Numeric(85.0)));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["emoji"], "🟢");
        assert_eq!(json["color"], "green");
        assert_eq!(json["label"], "Strong Match");
        assert_eq!(json["score"], 85.0);
        assert!(json["website"].is_null());
    }
}
