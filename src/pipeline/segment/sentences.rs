use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

/// Terminal punctuation (plus closing quotes/brackets) and the gap after it.
static TERMINAL_GAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[.!?]+["')\]]*[ \t]+"#).unwrap());

static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[-*•+]|\d{1,3}[.)]|[a-z]\))[ \t]+").unwrap());

/// Split `content` into sentence byte ranges with UAX #29 boundaries.
pub fn split_unicode(content: &str) -> Vec<Range<usize>> {
    let raw = content
        .split_sentence_bound_indices()
        .map(|(start, s)| start..start + s.len());
    finish(content, raw)
}

/// Punctuation-followed-by-capital heuristic; line breaks always split.
pub fn split_heuristic(content: &str) -> Vec<Range<usize>> {
    let mut raw = Vec::new();
    let mut line_start = 0;
    for line in content.split_inclusive('\n') {
        let mut start = line_start;
        for m in TERMINAL_GAP.find_iter(line) {
            let next_upper = line[m.end()..]
                .chars()
                .next()
                .is_some_and(|c| c.is_uppercase() || c.is_ascii_digit());
            if next_upper {
                raw.push(start..line_start + m.end());
                start = line_start + m.end();
            }
        }
        raw.push(start..line_start + line.len());
        line_start += line.len();
    }
    finish(content, raw.into_iter())
}

/// Trim, drop blanks, rejoin hard-wrapped fragments, strip list markers.
fn finish(content: &str, raw: impl Iterator<Item = Range<usize>>) -> Vec<Range<usize>> {
    let trimmed: Vec<Range<usize>> = raw
        .filter_map(|r| trim_range(content, r))
        .collect();

    let mut merged: Vec<Range<usize>> = Vec::with_capacity(trimmed.len());
    for range in trimmed {
        if let Some(prev) = merged.last_mut() {
            if is_wrapped_continuation(&content[prev.clone()], &content[range.clone()]) {
                prev.end = range.end;
                continue;
            }
        }
        merged.push(range);
    }

    merged
        .into_iter()
        .filter_map(|r| {
            let marker = LIST_MARKER
                .find(&content[r.clone()])
                .map(|m| m.end())
                .unwrap_or(0);
            trim_range(content, r.start + marker..r.end)
        })
        .collect()
}

fn trim_range(content: &str, range: Range<usize>) -> Option<Range<usize>> {
    let slice = &content[range.clone()];
    let lead = slice.len() - slice.trim_start().len();
    let trail = slice.len() - slice.trim_end().len();
    if lead == slice.len() {
        return None;
    }
    Some(range.start + lead..range.end - trail)
}

/// A fragment without terminal punctuation followed by one that starts
/// lowercase was split by a line wrap, not a sentence boundary.
fn is_wrapped_continuation(prev: &str, next: &str) -> bool {
    let prev_open = !prev.ends_with(['.', '!', '?', ':', ';', '"', ')']);
    let next_lower = next.chars().next().is_some_and(|c| c.is_lowercase());
    prev_open && next_lower
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts<'a>(content: &'a str, ranges: &[Range<usize>]) -> Vec<&'a str> {
        ranges.iter().map(|r| &content[r.clone()]).collect()
    }

    #[test]
    fn unicode_splits_on_terminal_punctuation() {
        let content = "The system must log in users. Reports shall export to PDF! Is that all?";
        let ranges = split_unicode(content);
        assert_eq!(
            texts(content, &ranges),
            vec![
                "The system must log in users.",
                "Reports shall export to PDF!",
                "Is that all?"
            ]
        );
    }

    #[test]
    fn unicode_keeps_abbreviations_and_decimals() {
        let content = "Uptime must be 99.9% per month, e.g. during business hours.";
        let ranges = split_unicode(content);
        assert_eq!(ranges.len(), 1);
    }

    #[test]
    fn heuristic_requires_capital_after_punctuation() {
        let content = "Users must log in. then continue. Admins manage roles.";
        let ranges = split_heuristic(content);
        assert_eq!(
            texts(content, &ranges),
            vec!["Users must log in. then continue.", "Admins manage roles."]
        );
    }

    #[test]
    fn list_markers_are_stripped() {
        let content = "- Users must log in.\n* Admins must audit access.\n2) Reports must export.";
        for ranges in [split_unicode(content), split_heuristic(content)] {
            assert_eq!(
                texts(content, &ranges),
                vec![
                    "Users must log in.",
                    "Admins must audit access.",
                    "Reports must export."
                ]
            );
        }
    }

    #[test]
    fn wrapped_lines_are_rejoined() {
        let content = "The system must send a confirmation\nemail after checkout.";
        let ranges = split_unicode(content);
        assert_eq!(ranges.len(), 1);
        assert_eq!(&content[ranges[0].clone()], content);
    }

    #[test]
    fn blank_content_yields_nothing() {
        assert!(split_unicode("   \n\t ").is_empty());
        assert!(split_heuristic("").is_empty());
    }
}
