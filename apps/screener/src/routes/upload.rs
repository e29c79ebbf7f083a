use std::path::{Path, PathBuf};

use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::ingest::archive::{extract_zip, find_resumes};
use crate::ingest::extract::extract_text_blocking;
use crate::ingest::files::{is_allowed, is_zip, sanitize_filename};
use crate::screening::job_details::JobRecord;
use crate::screening::session::Session;
use crate::state::AppState;

const JOB_FIELD: &str = "job_file";
const RESUME_FIELD: &str = "resume_files";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub session_id: Uuid,
    pub job_title: String,
    pub resume_count: usize,
}

/// An uploaded file part held in memory until validation passes.
#[derive(Debug)]
struct FilePart {
    filename: String,
    data: Bytes,
}

/// POST /upload
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let (job_part, resume_part) = read_parts(&mut multipart).await?;
    let (job_part, resume_part) = validate(job_part, resume_part)?;

    let session_id = Uuid::new_v4();
    let workdir = state.upload_root().join(session_id.to_string());

    let staged = stage_files(&workdir, job_part, resume_part).await;
    let (job, resume_files) = match staged {
        Ok(staged) => staged,
        Err(e) => {
            discard_workdir(&workdir).await;
            return Err(e);
        }
    };

    let session = state.sessions.insert(Session {
        id: session_id,
        job,
        resume_files,
        workdir,
        created_at: Utc::now(),
    });
    state.tracker.start(session_id);
    state.processor.spawn(session.clone());

    info!(
        session_id = %session_id,
        resumes = session.resume_count(),
        title = %session.job.title,
        "Upload accepted"
    );

    Ok(Json(UploadResponse {
        success: true,
        session_id,
        job_title: session.job.title.clone(),
        resume_count: session.resume_count(),
    }))
}

/// Collects the first `job_file` and `resume_files` parts; other fields are drained and ignored.
async fn read_parts(
    multipart: &mut Multipart,
) -> Result<(Option<FilePart>, Option<FilePart>), AppError> {
    let mut job = None;
    let mut resumes = None;

    while let Some(field) = multipart.next_field().await? {
        let slot = match field.name() {
            Some(JOB_FIELD) if job.is_none() => &mut job,
            Some(RESUME_FIELD) if resumes.is_none() => &mut resumes,
            _ => continue,
        };
        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await?;
        *slot = Some(FilePart { filename, data });
    }

    Ok((job, resumes))
}

fn validate(
    job: Option<FilePart>,
    resumes: Option<FilePart>,
) -> Result<(FilePart, FilePart), AppError> {
    let (Some(job), Some(resumes)) = (job, resumes) else {
        return Err(AppError::Validation("Missing required files".into()));
    };
    if job.filename.is_empty() || resumes.filename.is_empty() {
        return Err(AppError::Validation("No files selected".into()));
    }
    if !is_allowed(&job.filename) || !is_allowed(&resumes.filename) {
        return Err(AppError::Validation("Invalid file type".into()));
    }
    Ok((job, resumes))
}

/// Writes both parts under `workdir`, extracts the job text and resolves the resume list.
async fn stage_files(
    workdir: &Path,
    job: FilePart,
    resumes: FilePart,
) -> Result<(JobRecord, Vec<PathBuf>), AppError> {
    let job_dir = workdir.join("job");
    tokio::fs::create_dir_all(&job_dir).await.map_err(upload_error)?;

    let job_path = job_dir.join(sanitize_filename(&job.filename));
    tokio::fs::write(&job_path, &job.data).await.map_err(upload_error)?;

    let job_text = extract_text_blocking(job_path).await;
    if job_text.trim().is_empty() {
        return Err(AppError::Validation(
            "Could not extract text from job file".into(),
        ));
    }
    let job = JobRecord::from_text(&job_text);

    let resume_path = workdir.join(sanitize_filename(&resumes.filename));
    tokio::fs::write(&resume_path, &resumes.data)
        .await
        .map_err(upload_error)?;

    let resume_files = if is_zip(&resumes.filename) {
        let dest = workdir.join("resumes");
        tokio::task::spawn_blocking(move || {
            extract_zip(&resume_path, &dest).map(|_| find_resumes(&dest))
        })
        .await
        .map_err(upload_error)?
        .map_err(upload_error)?
    } else {
        vec![resume_path]
    };

    if resume_files.is_empty() {
        return Err(AppError::Validation("No valid resume files found".into()));
    }
    Ok((job, resume_files))
}

fn upload_error(e: impl std::fmt::Display) -> AppError {
    AppError::Upload(e.to_string())
}

async fn discard_workdir(workdir: &Path) {
    match tokio::fs::remove_dir_all(workdir).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Could not remove {}: {e}", workdir.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(filename: &str) -> Option<FilePart> {
        Some(FilePart {
            filename: filename.to_string(),
            data: Bytes::from_static(b"content"),
        })
    }

    fn reason(result: Result<(FilePart, FilePart), AppError>) -> String {
        match result {
            Err(AppError::Validation(msg)) => msg,
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_part() {
        assert_eq!(reason(validate(None, part("a.pdf"))), "Missing required files");
        assert_eq!(reason(validate(part("job.txt"), None)), "Missing required files");
    }

    #[test]
    fn test_empty_filename() {
        assert_eq!(reason(validate(part(""), part("a.pdf"))), "No files selected");
    }

    #[test]
    fn test_extension_checked_on_both_parts() {
        assert_eq!(reason(validate(part("job.exe"), part("a.pdf"))), "Invalid file type");
        assert_eq!(reason(validate(part("job.txt"), part("a.doc"))), "Invalid file type");
    }

    #[test]
    fn test_valid_parts_pass() {
        let (job, resumes) = validate(part("Job.TXT"), part("batch.zip")).unwrap();
        assert_eq!(job.filename, "Job.TXT");
        assert_eq!(resumes.filename, "batch.zip");
    }
}
