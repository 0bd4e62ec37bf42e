//! Document segmentation: headings → sections → offset-tracked sentences.
//!
//! Offsets are character (not byte) positions into the caller's original
//! text, so `text.chars().skip(start).take(end - start)` yields the raw span
//! a sentence was taken from. Line numbers are 1-based.

pub mod headings;
pub mod sentences;

use serde::Serialize;

use headings::{detect_heading, is_rule_line};

/// Section name used when a document has no headings.
pub const DEFAULT_SECTION: &str = "Document";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sentence {
    pub text: String,
    pub section: String,
    pub start: usize,
    pub end: usize,
    pub line_number: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub title: String,
    /// 0 for the implicit document section.
    pub level: usize,
    pub content: String,
    pub start: usize,
    pub end: usize,
    pub sentences: Vec<Sentence>,
}

/// Which sentence boundary detector runs first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundaryDetector {
    /// UAX #29 sentence boundaries, falling back to the heuristic when a
    /// non-blank section yields no sentences.
    #[default]
    Unicode,
    Heuristic,
}

#[derive(Debug, Clone, Default)]
pub struct Segmenter {
    detector: BoundaryDetector,
}

struct RawSection {
    title: String,
    level: usize,
    body: Option<(usize, usize)>,
}

impl Segmenter {
    pub fn new(detector: BoundaryDetector) -> Self {
        Self { detector }
    }

    /// Split `text` into sections and the flat, ordered list of sentences.
    ///
    /// Always returns at least one section.
    pub fn segment(&self, text: &str) -> (Vec<Section>, Vec<Sentence>) {
        let raw_sections = collect_sections(text);
        let mut tracker = OffsetTracker::new(text);
        let mut sections = Vec::with_capacity(raw_sections.len());
        let mut all_sentences = Vec::new();

        for raw in raw_sections {
            let Some((body_start, body_end)) = raw.body else {
                continue;
            };
            let body = &text[body_start..body_end];

            let mut ranges = match self.detector {
                BoundaryDetector::Unicode => sentences::split_unicode(body),
                BoundaryDetector::Heuristic => sentences::split_heuristic(body),
            };
            if ranges.is_empty() && !body.trim().is_empty() {
                ranges = sentences::split_heuristic(body);
            }

            let (section_start, _) = tracker.locate(body_start);
            let mut section_sentences = Vec::with_capacity(ranges.len());
            for range in ranges {
                let (start, line_number) = tracker.locate(body_start + range.start);
                let (end, _) = tracker.locate(body_start + range.end);
                section_sentences.push(Sentence {
                    text: collapse_whitespace(&body[range]),
                    section: raw.title.clone(),
                    start,
                    end,
                    line_number,
                });
            }
            let (section_end, _) = tracker.locate(body_end);

            all_sentences.extend(section_sentences.iter().cloned());
            sections.push(Section {
                title: raw.title,
                level: raw.level,
                content: body.trim().to_string(),
                start: section_start,
                end: section_end,
                sentences: section_sentences,
            });
        }

        if sections.is_empty() {
            sections.push(Section {
                title: DEFAULT_SECTION.to_string(),
                level: 0,
                content: String::new(),
                start: 0,
                end: 0,
                sentences: Vec::new(),
            });
        }

        tracing::debug!(
            sections = sections.len(),
            sentences = all_sentences.len(),
            "Document segmented"
        );
        (sections, all_sentences)
    }
}

/// Walk lines, opening a new section at every heading. Text before the first
/// heading lands in the implicit document section.
fn collect_sections(text: &str) -> Vec<RawSection> {
    let mut lines: Vec<(usize, &str)> = Vec::new();
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        lines.push((offset, line.trim_end_matches(['\n', '\r'])));
        offset += line.len();
    }

    let mut sections = Vec::new();
    let mut current = RawSection {
        title: DEFAULT_SECTION.to_string(),
        level: 0,
        body: None,
    };

    let mut i = 0;
    while i < lines.len() {
        let (start, line) = lines[i];
        let next = lines.get(i + 1).map(|(_, l)| *l);

        if let Some(heading) = detect_heading(line, next) {
            sections.push(std::mem::replace(
                &mut current,
                RawSection {
                    title: heading.title,
                    level: heading.level,
                    body: None,
                },
            ));
            i += if heading.underlined { 2 } else { 1 };
            continue;
        }

        if !line.trim().is_empty() && !is_rule_line(line) {
            let end = start + line.len();
            current.body = Some(match current.body {
                Some((body_start, _)) => (body_start, end),
                None => (start, end),
            });
        }
        i += 1;
    }
    sections.push(current);
    sections
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Converts ascending byte offsets to (char offset, line number) in one pass.
struct OffsetTracker<'a> {
    text: &'a str,
    byte: usize,
    chars: usize,
    line: usize,
}

impl<'a> OffsetTracker<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            byte: 0,
            chars: 0,
            line: 1,
        }
    }

    fn locate(&mut self, byte: usize) -> (usize, usize) {
        if byte < self.byte {
            self.byte = 0;
            self.chars = 0;
            self.line = 1;
        }
        let span = &self.text[self.byte..byte];
        self.chars += span.chars().count();
        self.line += span.matches('\n').count();
        self.byte = byte;
        (self.chars, self.line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn char_slice(text: &str, start: usize, end: usize) -> String {
        text.chars().skip(start).take(end - start).collect()
    }

    #[test]
    fn unstructured_text_becomes_document_section() {
        let text = "The system must authenticate users. Reports must export to CSV.";
        let (sections, sentences) = Segmenter::default().segment(text);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title, DEFAULT_SECTION);
        assert_eq!(sections[0].level, 0);
        assert_eq!(sentences.len(), 2);
        assert!(sentences.iter().all(|s| s.section == DEFAULT_SECTION));
    }

    #[test]
    fn empty_text_still_yields_a_section() {
        let (sections, sentences) = Segmenter::default().segment("");
        assert_eq!(sections.len(), 1);
        assert!(sentences.is_empty());
    }

    #[test]
    fn headings_open_sections() {
        let text = "Intro text here.\n\n# Login\nUsers must log in.\n\n## Export\nAdmins can export logs.\n\nSECURITY\nPasswords must be hashed.\n";
        let (sections, sentences) = Segmenter::default().segment(text);
        let titles: Vec<&str> = sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Document", "Login", "Export", "SECURITY"]);
        assert_eq!(sections[2].level, 2);
        assert_eq!(sentences.len(), 4);
        assert_eq!(sentences[3].section, "SECURITY");
    }

    #[test]
    fn underlined_heading_consumes_rule_line() {
        let text = "Reporting\n=========\nReports must be exported nightly.\n";
        let (sections, sentences) = Segmenter::default().segment(text);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title, "Reporting");
        assert_eq!(sentences[0].text, "Reports must be exported nightly.");
    }

    #[test]
    fn empty_sections_are_dropped() {
        let text = "# Empty\n# Filled\nThe system shall log events.";
        let (sections, _) = Segmenter::default().segment(text);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title, "Filled");
    }

    #[test]
    fn offsets_are_character_positions() {
        let text = "# Überblick\nDer Nutzer muss sich anmelden. Das System muss Daten verschlüsseln.";
        let (_, sentences) = Segmenter::default().segment(text);
        assert_eq!(sentences.len(), 2);
        for s in &sentences {
            assert_eq!(char_slice(text, s.start, s.end), s.text);
        }
        assert_eq!(sentences[0].line_number, 2);
    }

    #[test]
    fn line_numbers_track_newlines() {
        let text = "First line must work.\n\nThird line must work too.";
        let (_, sentences) = Segmenter::default().segment(text);
        assert_eq!(sentences[0].line_number, 1);
        assert_eq!(sentences[1].line_number, 3);
    }

    #[test]
    fn concatenated_sentences_reproduce_text() {
        let docs = [
            "The system must authenticate users with email and password. Password must be encrypted using bcrypt.",
            "Users can search orders.\nAdmins may refund payments!   Is auditing required?\n\n\nYes, always.",
            "Line one without punctuation\ncontinues here. Next sentence.",
            "Ünïcödé text must survive. Ça marche très bien.",
        ];
        for detector in [BoundaryDetector::Unicode, BoundaryDetector::Heuristic] {
            for doc in docs {
                let (_, sentences) = Segmenter::new(detector).segment(doc);
                let joined: String = sentences
                    .iter()
                    .map(|s| s.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");
                assert_eq!(collapse_whitespace(&joined), collapse_whitespace(doc));
            }
        }
    }

    #[test]
    fn heuristic_detector_splits_sentences() {
        let text = "Users must log in. Admins must approve requests.";
        let (_, sentences) = Segmenter::new(BoundaryDetector::Heuristic).segment(text);
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[1].start, 19);
    }
}
