//! Job-detail parser — guesses a posting's title from its opening lines.

use serde::{Deserialize, Serialize};

/// Title used when no opening line looks like a role name.
pub const FALLBACK_TITLE: &str = "Software Engineer";

const TITLE_KEYWORDS: &[&str] = &["engineer", "developer", "analyst", "manager", "specialist"];
const TITLE_SCAN_LINES: usize = 5;
const MIN_TITLE_CHARS: usize = 10;
const MAX_TITLE_CHARS: usize = 99;

/// Structured view of an uploaded job posting. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub title: String,
    pub description: String,
    /// Currently the full posting text, identical to `description`.
    pub requirements: String,
}

impl JobRecord {
    pub fn from_text(job_text: &str) -> Self {
        Self {
            title: extract_title(job_text),
            description: job_text.to_string(),
            requirements: job_text.to_string(),
        }
    }
}

/// Picks the first of the opening non-empty lines that is title-sized and names a role.
pub fn extract_title(job_text: &str) -> String {
    job_text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(TITLE_SCAN_LINES)
        .find(|line| is_title_candidate(line))
        .map(str::to_string)
        .unwrap_or_else(|| FALLBACK_TITLE.to_string())
}

fn is_title_candidate(line: &str) -> bool {
    let len = line.chars().count();
    if !(MIN_TITLE_CHARS..=MAX_TITLE_CHARS).contains(&len) {
        return false;
    }
    let lower = line.to_lowercase();
    TITLE_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engineer_line_becomes_title() {
        let text = "Acme Corp\nSenior Backend Engineer\nWe build things.";
        assert_eq!(extract_title(text), "Senior Backend Engineer");
    }

    #[test]
    fn test_keyword_match_is_case_insensitive() {
        let text = "DATA ANALYST - REMOTE\nRequirements: SQL";
        assert_eq!(extract_title(text), "DATA ANALYST - REMOTE");
    }

    #[test]
    fn test_no_qualifying_line_falls_back() {
        let text = "About us\nWe are a bakery.\nApply today.";
        assert_eq!(extract_title(text), FALLBACK_TITLE);
    }

    #[test]
    fn test_empty_text_falls_back() {
        assert_eq!(extract_title(""), FALLBACK_TITLE);
        assert_eq!(extract_title("   \n\n  "), FALLBACK_TITLE);
    }

    #[test]
    fn test_only_first_five_non_empty_lines_are_scanned() {
        let text = "one\n\n\ntwo\nthree\n\nfour\nfive\nPlatform Engineer, Infra";
        assert_eq!(extract_title(text), FALLBACK_TITLE);

        let text = "\n\n\n\n\n\nPlatform Engineer, Infra";
        assert_eq!(extract_title(text), "Platform Engineer, Infra");
    }

    #[test]
    fn test_length_bounds() {
        // exactly 10 characters qualifies
        assert_eq!(extract_title("A Engineer"), "A Engineer");
        // 9 characters does not
        assert_eq!(extract_title("Engineer!"), FALLBACK_TITLE);

        let at_limit = format!("Engineer {}", "x".repeat(90));
        assert_eq!(at_limit.chars().count(), 99);
        assert_eq!(extract_title(&at_limit), at_limit);

        let too_long = format!("Engineer {}", "x".repeat(91));
        assert_eq!(extract_title(&too_long), FALLBACK_TITLE);
    }

    #[test]
    fn test_lines_are_trimmed_before_matching() {
        let text = "    Product Manager, Payments    \nbody";
        assert_eq!(extract_title(text), "Product Manager, Payments");
    }

    #[test]
    fn test_first_match_wins() {
        let text = "Junior Developer Role\nSenior Developer Role";
        assert_eq!(extract_title(text), "Junior Developer Role");
    }

    #[test]
    fn test_job_record_duplicates_description_into_requirements() {
        let text = "QA Specialist (Contract)\nMust know Selenium.";
        let record = JobRecord::from_text(text);
        assert_eq!(record.title, "QA Specialist (Contract)");
        assert_eq!(record.description, text);
        assert_eq!(record.requirements, record.description);
    }
}
