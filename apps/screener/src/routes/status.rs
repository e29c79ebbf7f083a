use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use url::Url;
use uuid::Uuid;

use crate::render;
use crate::screening::report::ResultsPayload;
use crate::screening::tracker::{SessionStatus, StatusSnapshot};
use crate::state::AppState;

fn lookup(state: &AppState, raw_id: &str) -> StatusSnapshot {
    match Uuid::parse_str(raw_id) {
        Ok(id) => state.tracker.get(&id),
        Err(_) => StatusSnapshot::Missing {
            status: SessionStatus::NotFound,
        },
    }
}

/// `/processing/<session_id>` with the id percent-encoded as one path segment.
fn processing_path(session_id: &str) -> String {
    let Ok(mut url) = Url::parse("http://screener.local/processing") else {
        return "/".to_string();
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.push(session_id);
    }
    url.path().to_string()
}

/// GET /status/:session_id
pub async fn handle_status(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Json<StatusSnapshot> {
    Json(lookup(&state, &session_id))
}

/// GET /results/:session_id
/// Renders the report once the session has completed; anything else, unknown ids included,
/// goes to the progress page.
pub async fn handle_results(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    match completed_results(&state, &session_id) {
        Some((id, results)) => {
            let session = state.sessions.get(&id);
            render::results(session.as_ref().map(|s| &s.job), &results)
        }
        None => Redirect::to(&processing_path(&session_id)).into_response(),
    }
}

fn completed_results(state: &AppState, raw_id: &str) -> Option<(Uuid, ResultsPayload)> {
    let id = Uuid::parse_str(raw_id).ok()?;
    match state.tracker.get(&id) {
        StatusSnapshot::Known(record) if record.status == SessionStatus::Completed => {
            record.results.map(|results| (id, results))
        }
        _ => None,
    }
}

/// GET /processing/:session_id
pub async fn handle_processing(Path(session_id): Path<String>) -> Response {
    render::processing(&session_id)
}
