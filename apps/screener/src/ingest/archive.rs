//! Zip unpacking and resume discovery for batch uploads.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;
use walkdir::WalkDir;

const RESUME_EXTENSION: &str = "pdf";

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Unpacks every entry of `archive_path` under `dest`, returning the number of files written.
/// Entries whose names would land outside `dest` are skipped.
pub fn extract_zip(archive_path: &Path, dest: &Path) -> Result<usize, ArchiveError> {
    let mut archive = zip::ZipArchive::new(File::open(archive_path)?)?;
    fs::create_dir_all(dest)?;

    let mut written = 0;
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let Some(relative) = entry.enclosed_name().map(Path::to_path_buf) else {
            warn!("Skipping unsafe zip entry name: {}", entry.name());
            continue;
        };
        let target = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&target)?;
        io::copy(&mut entry, &mut out)?;
        written += 1;
    }
    Ok(written)
}

/// Every `.pdf` file under `dir`, recursively, in path order.
pub fn find_resumes(dir: &Path) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(err) => {
                warn!("Skipping unreadable path during resume discovery: {err}");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .map(|ext| ext.eq_ignore_ascii_case(RESUME_EXTENSION))
                .unwrap_or(false)
        })
        .map(|e| e.into_path())
        .collect();
    found.sort();
    found
}
