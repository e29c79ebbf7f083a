//! Text extraction for PDF, DOCX and plain-text documents.
//!
//! Every failure degrades to an empty string; callers decide whether empty text is fatal.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
enum ExtractError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF extraction failed: {0}")]
    Pdf(String),

    #[error("DOCX archive error: {0}")]
    Docx(#[from] zip::result::ZipError),

    #[error("unsupported document type: {0}")]
    Unsupported(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentKind {
    Pdf,
    Docx,
    Text,
}

impl DocumentKind {
    fn detect(path: &Path) -> Result<Self, ExtractError> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "pdf" => Ok(DocumentKind::Pdf),
            "docx" => Ok(DocumentKind::Docx),
            "txt" => Ok(DocumentKind::Text),
            other => Err(ExtractError::Unsupported(other.to_string())),
        }
    }
}

/// Extracts plain text from `path`, returning an empty string on any failure.
/// Blocking; use `extract_text_blocking` from async code.
pub fn extract_text(path: &Path) -> String {
    match try_extract(path) {
        Ok(text) => text,
        Err(e) => {
            error!("Error extracting text from {}: {e}", path.display());
            String::new()
        }
    }
}

/// Runs `extract_text` on the blocking pool. A panic inside a parser also yields "".
pub async fn extract_text_blocking(path: PathBuf) -> String {
    let shown = path.display().to_string();
    match tokio::task::spawn_blocking(move || extract_text(&path)).await {
        Ok(text) => text,
        Err(e) => {
            warn!("Text extraction task for {shown} aborted: {e}");
            String::new()
        }
    }
}

fn try_extract(path: &Path) -> Result<String, ExtractError> {
    match DocumentKind::detect(path)? {
        DocumentKind::Pdf => {
            let bytes = std::fs::read(path)?;
            pdf_extract::extract_text_from_mem(&bytes).map_err(|e| ExtractError::Pdf(e.to_string()))
        }
        DocumentKind::Docx => extract_docx(path),
        DocumentKind::Text => {
            let bytes = std::fs::read(path)?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
    }
}

fn extract_docx(path: &Path) -> Result<String, ExtractError> {
    let file = std::fs::File::open(path)?;
    let mut archive = zip::ZipArchive::new(file)?;
    let mut xml = String::new();
    archive.by_name("word/document.xml")?.read_to_string(&mut xml)?;
    Ok(docx_xml_to_text(&xml))
}

fn tag_pattern() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r"<[^>]*>").expect("static regex"))
}

/// Flattens WordprocessingML into text: paragraphs and breaks become newlines, tabs stay tabs.
fn docx_xml_to_text(xml: &str) -> String {
    let xml = xml
        .replace("</w:p>", "\n")
        .replace("<w:br/>", "\n")
        .replace("<w:tab/>", "\t");
    let stripped = tag_pattern().replace_all(&xml, "");
    stripped
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}
