// Prompts for the LLM resume scorer.

use askama::Template;

/// Role description; `llm_client::prompts::JSON_ONLY_SYSTEM` is appended at runtime.
pub const SCORING_SYSTEM: &str = "You are an experienced technical recruiter. \
    You compare one candidate resume against one job description and rate the fit.";

/// Resume text beyond this many characters is cut before prompting.
pub const MAX_RESUME_CHARS: usize = 24_000;

/// Job description text beyond this many characters is cut before prompting.
pub const MAX_JOB_CHARS: usize = 12_000;

/// Per-resume scoring prompt. Values are inserted once, so placeholder-like text inside a
/// job description or resume is left alone.
#[derive(Template)]
#[template(path = "scoring_prompt.txt")]
struct ScoringPrompt<'a> {
    job_description: &'a str,
    filename: &'a str,
    resume_text: &'a str,
}

pub fn build_scoring_prompt(
    job_description: &str,
    filename: &str,
    resume_text: &str,
) -> Result<String, askama::Error> {
    ScoringPrompt {
        job_description: truncate_chars(job_description, MAX_JOB_CHARS),
        filename,
        resume_text: truncate_chars(resume_text, MAX_RESUME_CHARS),
    }
    .render()
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_fills_every_placeholder() {
        let prompt =
            build_scoring_prompt("Rust Engineer wanted", "jane.pdf", "Jane knows Rust").unwrap();
        assert!(prompt.contains("Rust Engineer wanted"));
        assert!(prompt.contains("RESUME (jane.pdf)"));
        assert!(prompt.contains("Jane knows Rust"));
        assert!(prompt.contains("\"match_reasons\""));
        assert!(!prompt.contains("job_description }}"));
    }

    #[test]
    fn test_placeholder_text_in_job_is_not_expanded() {
        let prompt = build_scoring_prompt(
            "Paste {resume_text} here, or {{ resume_text }}",
            "a & b <cv>.pdf",
            "UNIQUE-RESUME-BODY",
        )
        .unwrap();
        assert_eq!(prompt.matches("UNIQUE-RESUME-BODY").count(), 1);
        assert!(prompt.contains("Paste {resume_text} here, or {{ resume_text }}"));
        assert!(prompt.contains("RESUME (a & b <cv>.pdf)"));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("short", 100), "short");
    }
}
