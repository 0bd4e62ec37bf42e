use std::sync::LazyLock;

use regex::Regex;

static MARKDOWN_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.+?)(?:\s+#+)?\s*$").unwrap());

static NUMBERED_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+(?:\.\d+)*)\.?\s+(\S.*)$").unwrap());

static RULE_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*(={3,}|-{3,})\s*$").unwrap());

static MODAL_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(must|shall|should|will|can|need|needs|required)\b").unwrap()
});

/// Longest line still considered a heading candidate.
const MAX_HEADING_CHARS: usize = 80;
const MAX_NUMBERED_TITLE_WORDS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub title: String,
    pub level: usize,
    /// The following line is an `===`/`---` rule that belongs to this heading.
    pub underlined: bool,
}

/// A line made only of `=` or `-` characters.
pub fn is_rule_line(line: &str) -> bool {
    RULE_LINE.is_match(line)
}

/// Detect a heading on `line`, looking at `next` for setext-style underlines.
///
/// Cascade: markdown `#`, numbered `1.2`, ALL-CAPS, underlined.
pub fn detect_heading(line: &str, next: Option<&str>) -> Option<Heading> {
    let trimmed = line.trim();
    if trimmed.is_empty() || is_rule_line(trimmed) {
        return None;
    }

    let underline = next.and_then(|n| {
        let n = n.trim();
        if is_rule_line(n) && trimmed.chars().count() <= MAX_HEADING_CHARS {
            Some(if n.starts_with('=') { 1 } else { 2 })
        } else {
            None
        }
    });

    if let Some(caps) = MARKDOWN_HEADING.captures(trimmed) {
        return Some(Heading {
            title: caps[2].trim().to_string(),
            level: caps[1].len(),
            underlined: underline.is_some(),
        });
    }

    if let Some(caps) = NUMBERED_HEADING.captures(trimmed) {
        let title = caps[2].trim();
        if is_numbered_title(title) {
            return Some(Heading {
                title: title.to_string(),
                level: caps[1].split('.').count(),
                underlined: underline.is_some(),
            });
        }
    }

    if is_all_caps(trimmed) {
        return Some(Heading {
            title: trimmed.to_string(),
            level: 1,
            underlined: underline.is_some(),
        });
    }

    underline.map(|level| Heading {
        title: trimmed.to_string(),
        level,
        underlined: true,
    })
}

/// Numbered list items that read like sentences are content, not headings.
fn is_numbered_title(title: &str) -> bool {
    let starts_upper = title.chars().next().is_some_and(|c| c.is_uppercase());
    let ends_clean = !title.ends_with(['.', '!', '?', ':', ';', ',']);
    let short = title.split_whitespace().count() <= MAX_NUMBERED_TITLE_WORDS;
    starts_upper && ends_clean && short && !MODAL_WORD.is_match(title)
}

fn is_all_caps(line: &str) -> bool {
    if line.chars().count() < 5 || line.chars().count() > MAX_HEADING_CHARS {
        return false;
    }
    let mut has_letter = false;
    for c in line.chars() {
        if c.is_alphabetic() {
            if c.is_lowercase() {
                return false;
            }
            has_letter = true;
        } else if !c.is_whitespace() {
            return false;
        }
    }
    has_letter
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markdown_heading_levels() {
        let h = detect_heading("## User Management", None).unwrap();
        assert_eq!(h.title, "User Management");
        assert_eq!(h.level, 2);
        assert!(!h.underlined);

        let h = detect_heading("# Overview #", None).unwrap();
        assert_eq!(h.title, "Overview");
        assert_eq!(h.level, 1);
    }

    #[test]
    fn numbered_heading_level_counts_parts() {
        let h = detect_heading("2.3.1 Audit Logging", None).unwrap();
        assert_eq!(h.title, "Audit Logging");
        assert_eq!(h.level, 3);

        let h = detect_heading("4. Reporting", None).unwrap();
        assert_eq!(h.level, 1);
    }

    #[test]
    fn numbered_sentence_is_not_heading() {
        assert!(detect_heading("1. Users must log in with email.", None).is_none());
        assert!(detect_heading("1.2 The system shall export reports", None).is_none());
    }

    #[test]
    fn all_caps_line_is_heading() {
        let h = detect_heading("SECURITY REQUIREMENTS", None).unwrap();
        assert_eq!(h.level, 1);
        assert!(detect_heading("API", None).is_none());
        assert!(detect_heading("THE SYSTEM MUST LOG IN.", None).is_none());
    }

    #[test]
    fn underlined_heading() {
        let h = detect_heading("Reporting", Some("=========")).unwrap();
        assert_eq!(h.level, 1);
        assert!(h.underlined);

        let h = detect_heading("Exports", Some("-----")).unwrap();
        assert_eq!(h.level, 2);
    }

    #[test]
    fn plain_sentence_is_not_heading() {
        assert!(detect_heading("The system must export data.", None).is_none());
        assert!(detect_heading("", None).is_none());
        assert!(detect_heading("=====", None).is_none());
    }

    #[test]
    fn rule_line_detection() {
        assert!(is_rule_line("---"));
        assert!(is_rule_line("  ======  "));
        assert!(!is_rule_line("--"));
        assert!(!is_rule_line("-- note"));
    }
}
