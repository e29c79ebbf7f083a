//! HTML rendering for the browser-facing pages.
//!
//! Static pages are compiled in. The processing and results pages are askama templates
//! under `templates/`, which escape every interpolated value.

use askama::Template;
use axum::{
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};
use tracing::error;

use crate::screening::job_details::JobRecord;
use crate::screening::report::{CandidateRecord, ResultsPayload};

const INDEX_HTML: &str = include_str!("../static/index.html");
const NOT_FOUND_HTML: &str = include_str!("../static/404.html");
const SERVER_ERROR_HTML: &str = include_str!("../static/500.html");
const STYLE_CSS: &str = include_str!("../static/style.css");

const UNTITLED_JOB: &str = "Job Position";

#[derive(Template)]
#[template(path = "processing.html")]
struct ProcessingPage<'a> {
    session_id: &'a str,
}

#[derive(Template)]
#[template(path = "results.html")]
struct ResultsPage<'a> {
    title: &'a str,
    total: usize,
    top_score: String,
    average_score: String,
    qualified: usize,
    generated: String,
    candidates: Vec<CandidateRow<'a>>,
}

struct CandidateRow<'a> {
    rank: usize,
    filename: &'a str,
    color: &'a str,
    emoji: &'a str,
    score: String,
    label: &'a str,
    reasons: &'a [String],
    website: &'a str,
    /// Only http(s) URLs become links; anything else is shown as text.
    linked: bool,
    red_flags: &'a [String],
}

impl<'a> CandidateRow<'a> {
    fn new(rank: usize, c: &'a CandidateRecord) -> Self {
        let website = c.website.as_deref().unwrap_or_default();
        Self {
            rank,
            filename: &c.filename,
            color: &c.color,
            emoji: &c.emoji,
            score: c.score.to_string(),
            label: &c.label,
            reasons: &c.match_reasons,
            website,
            linked: website.starts_with("http://") || website.starts_with("https://"),
            red_flags: &c.red_flags,
        }
    }
}

pub fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub fn stylesheet() -> Response {
    ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], STYLE_CSS).into_response()
}

pub fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Html(NOT_FOUND_HTML)).into_response()
}

pub fn server_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, Html(SERVER_ERROR_HTML)).into_response()
}

pub fn processing(session_id: &str) -> Response {
    html_or_error(ProcessingPage { session_id }.render())
}

pub fn results(job: Option<&JobRecord>, results: &ResultsPayload) -> Response {
    let stats = &results.statistics;
    let page = ResultsPage {
        title: job.map(|j| j.title.as_str()).unwrap_or(UNTITLED_JOB),
        total: stats.total_candidates,
        top_score: format!("{:.0}", stats.top_score),
        average_score: format!("{:.1}", stats.average_score),
        qualified: stats.qualified_candidates,
        generated: results.timestamp.format("%Y-%m-%d %H:%M UTC").to_string(),
        candidates: results
            .candidates
            .iter()
            .enumerate()
            .map(|(i, c)| CandidateRow::new(i + 1, c))
            .collect(),
    };
    html_or_error(page.render())
}

fn html_or_error(rendered: Result<String, askama::Error>) -> Response {
    match rendered {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("Template rendering failed: {e}");
            server_error()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::Score;
    use chrono::Utc;
    use http_body_util::BodyExt;

    fn candidate(filename: &str, score: Score) -> CandidateRecord {
        CandidateRecord {
            filename: filename.to_string(),
            score,
            emoji: "🟢".to_string(),
            color: "green".to_string(),
            label: "Strong Match".to_string(),
            match_reasons: vec!["5 years of <Rust>".to_string()],
            website: Some("https://example.com/jane".to_string()),
            red_flags: vec![],
        }
    }

    async fn page(response: Response) -> String {
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_results_page_lists_candidates_in_order_and_escapes() {
        let payload = ResultsPayload::new(
            vec![
                candidate("alice.pdf", Score::Numeric(92.0)),
                candidate("<b>bob</b>.pdf", Score::unscored()),
            ],
            Utc::now(),
        );
        let job = JobRecord::from_text("Senior <Rust> Engineer\nbody");
        let html = page(results(Some(&job), &payload)).await;

        assert!(html.contains("Senior &lt;Rust&gt; Engineer"));
        assert!(!html.contains("<Rust>"));
        assert!(!html.contains("<b>bob</b>"));
        let alice = html.find("alice.pdf").unwrap();
        let bob = html.find("bob").unwrap();
        assert!(alice < bob);
        assert!(html.contains("N/A"));
        assert!(html.contains("<a href=\"https:"));
    }

    #[tokio::test]
    async fn test_results_page_without_job_record_uses_placeholder() {
        let payload = ResultsPayload::new(vec![], Utc::now());
        let html = page(results(None, &payload)).await;
        assert!(html.contains("Results: Job Position"));
        assert!(html.contains("No candidates were scored."));
    }

    #[test]
    fn test_non_http_website_is_not_linked() {
        let mut c = candidate("x.pdf", Score::Numeric(50.0));
        c.website = Some("javascript:alert(1)".to_string());
        assert!(!CandidateRow::new(1, &c).linked);
        c.website = None;
        let row = CandidateRow::new(1, &c);
        assert!(!row.linked);
        assert_eq!(row.website, "");
    }

    #[tokio::test]
    async fn test_processing_page_embeds_escaped_session_id() {
        let html = page(processing("abc\"><script>")).await;
        assert!(html.contains("data-session-id=\"abc"));
        assert!(html.contains("&gt;&lt;script&gt;"));
        assert!(!html.contains("abc\"><script>"));
    }
}
