use axum::{extract::rejection::JsonRejection, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;

const UNNAMED_CANDIDATE: &str = "candidate";

/// Every field is optional; the stub acknowledges whatever it is given.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ContactRequest {
    pub candidate_name: Option<String>,
    pub candidate_email: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub success: bool,
    pub message: String,
}

/// POST /contact
/// Acknowledges the request without sending anything.
pub async fn handle_contact(
    payload: Result<Json<ContactRequest>, JsonRejection>,
) -> Result<Json<ContactResponse>, AppError> {
    let Json(req) = payload.map_err(|e| AppError::Validation(e.body_text()))?;

    let name = req
        .candidate_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(UNNAMED_CANDIDATE);

    info!(
        candidate = %name,
        email = req.candidate_email.as_deref().unwrap_or_default(),
        message_len = req.message.as_deref().map(str::len).unwrap_or(0),
        "Contact request received"
    );

    Ok(Json(ContactResponse {
        success: true,
        message: format!("Email prepared for {name}"),
    }))
}
