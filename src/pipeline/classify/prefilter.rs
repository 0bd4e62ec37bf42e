//! Cheap candidate screening ahead of the requirement detector.
//!
//! Drops fragments that are too short or too long to be a requirement,
//! section labels that slipped through as sentences, and narrative notes
//! ("we discussed", "meeting minutes") that carry no requirement signal.

use std::sync::LazyLock;

use regex::Regex;

pub const MIN_CANDIDATE_CHARS: usize = 10;
pub const MAX_CANDIDATE_CHARS: usize = 500;

static NOTE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\bwe discussed\b",
        r"\blast meeting\b",
        r"\bthis document describes\b",
        r"\bnote:",
        r"\bmockups?\b",
        r"\barchitecture\b",
        r"\bbackground\b",
        r"\bintroduction\b",
        r"\bmeeting minutes\b",
        r"\bgiới thiệu\b",
        r"\bmục tiêu\b",
        r"\bphạm vi\b",
    ]
    .iter()
    .map(|p| Regex::new(&format!("(?i){p}")).unwrap())
    .collect()
});

static REQUIREMENT_SIGNAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(must|shall|should|required to|needs to|need to|has to|be able to|phải|cần|bắt buộc|được phép|nên|yêu cầu)\b",
    )
    .unwrap()
});

/// Section labels written as a line of their own, optionally with a colon.
static HEADING_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(#{1,6}\s+.*|(introduction|background|scope|constraints|overview|glossary|appendix|references|giới thiệu|mục tiêu|phạm vi|ràng buộc|lịch trình|rủi ro|phụ lục)\s*:?\s*)$",
    )
    .unwrap()
});

pub fn has_requirement_signal(text: &str) -> bool {
    REQUIREMENT_SIGNAL.is_match(text)
}

pub fn looks_like_note(text: &str) -> bool {
    NOTE_PATTERNS.iter().any(|p| p.is_match(text))
}

/// Whether `text` should reach the requirement detector.
pub fn is_valid_candidate(text: &str) -> bool {
    let text = text.trim();
    let chars = text.chars().count();
    if !(MIN_CANDIDATE_CHARS..=MAX_CANDIDATE_CHARS).contains(&chars) {
        return false;
    }
    if HEADING_LABEL.is_match(text) {
        return false;
    }
    !looks_like_note(text) || has_requirement_signal(text)
}
