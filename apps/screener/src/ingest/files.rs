//! Upload filename rules: extension allow-list and sanitizing client-supplied names.

/// Extensions accepted for either upload part.
pub const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "txt", "docx", "zip"];

const FALLBACK_STEM: &str = "upload";

/// Lowercased text after the last `.`, if the name has one.
pub fn extension_of(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    (!ext.is_empty()).then(|| ext.to_ascii_lowercase())
}

pub fn is_allowed(filename: &str) -> bool {
    extension_of(filename)
        .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

pub fn is_zip(filename: &str) -> bool {
    extension_of(filename).as_deref() == Some("zip")
}

/// Reduces a client filename to a safe basename: directory parts dropped, whitespace
/// turned into `_`, anything outside `[A-Za-z0-9._-]` removed, no leading dots.
/// The extension is kept lowercased so format detection still works.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or(filename);

    let (stem, ext) = match base.rsplit_once('.') {
        Some((stem, ext)) => (stem, Some(ext)),
        None => (base, None),
    };

    let stem = clean_component(stem);
    let stem = if stem.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        stem
    };

    match ext.map(clean_component).filter(|e| !e.is_empty()) {
        Some(ext) => format!("{stem}.{}", ext.to_ascii_lowercase()),
        None => stem,
    }
}

fn clean_component(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter_map(|c| match c {
            c if c.is_whitespace() => Some('_'),
            c if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') => Some(c),
            _ => None,
        })
        .collect();
    cleaned.trim_start_matches('.').to_string()
}
