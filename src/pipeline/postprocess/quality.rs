//! Script-aware quality gates.
//!
//! Upstream classifiers are trained on Latin-script corpora, so text that
//! carries diacritics (Vietnamese, French, ...) gets looser length and
//! confidence thresholds than plain ASCII text.

use std::sync::LazyLock;

use regex::Regex;

use super::PostProcessConfig;
use crate::models::task::GeneratedTask;

/// Share of non-ASCII letters above which text counts as diacritic-bearing.
const DIACRITIC_RATIO: f32 = 0.05;

static INTERFACE_ONLY_CRITERION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(wcag|accessib\w*|screen readers?|responsive\w*|keyboard navigation|aria|colou?r contrast|mobile devices?)\b",
    )
    .unwrap()
});

/// A slot that fell back to the "unknown" label: the whole title, or the
/// trailing object slot ("Implement export for unknown").
static PLACEHOLDER_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(^|\s)unknown\s*$").unwrap());

static GENERIC_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(implement|add|build|system|feature)\s*$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Latin,
    Diacritic,
}

pub fn detect_script(text: &str) -> Script {
    let mut letters = 0usize;
    let mut accented = 0usize;
    for ch in text.chars().filter(|c| c.is_alphabetic()) {
        letters += 1;
        if !ch.is_ascii() {
            accented += 1;
        }
    }
    if letters > 0 && accented as f32 / letters as f32 >= DIACRITIC_RATIO {
        Script::Diacritic
    } else {
        Script::Latin
    }
}

/// Repeated leading word or a bare generic verb/noun.
pub fn is_low_quality_title(title: &str) -> bool {
    let words: Vec<String> = title.split_whitespace().map(str::to_lowercase).collect();
    (words.len() >= 2 && words[0] == words[1]) || GENERIC_TITLE.is_match(title.trim())
}

/// Remove accessibility/layout criteria from tasks that are not UI work.
pub fn strip_interface_criteria(task: &mut GeneratedTask) -> usize {
    if task.task_type == "interface" {
        return 0;
    }
    let before = task.acceptance_criteria.len();
    task.acceptance_criteria
        .retain(|c| !INTERFACE_ONLY_CRITERION.is_match(c));
    before - task.acceptance_criteria.len()
}

fn rejection_reason(task: &GeneratedTask, config: &PostProcessConfig) -> Option<&'static str> {
    let (min_chars, min_confidence) = match detect_script(&format!("{} {}", task.title, task.description)) {
        Script::Latin => (config.min_title_chars, config.min_confidence),
        Script::Diacritic => (config.diacritic_min_title_chars, config.diacritic_min_confidence),
    };

    if task.title.trim().chars().count() < min_chars {
        return Some("title too short");
    }
    if task.confidence < min_confidence {
        return Some("confidence too low");
    }
    if PLACEHOLDER_TITLE.is_match(task.title.trim()) {
        return Some("placeholder text");
    }
    if is_low_quality_title(&task.title) {
        return Some("generic title");
    }
    None
}

pub fn filter_low_quality(tasks: Vec<GeneratedTask>, config: &PostProcessConfig) -> Vec<GeneratedTask> {
    let total = tasks.len();
    let kept: Vec<GeneratedTask> = tasks
        .into_iter()
        .filter_map(|mut task| {
            if let Some(reason) = rejection_reason(&task, config) {
                tracing::debug!(title = %task.title, confidence = task.confidence, reason, "Dropped low-quality task");
                return None;
            }
            let stripped = strip_interface_criteria(&mut task);
            if stripped > 0 {
                tracing::debug!(title = %task.title, stripped, "Removed interface-only criteria");
            }
            Some(task)
        })
        .collect();

    tracing::info!(dropped = total - kept.len(), kept = kept.len(), "Quality filter applied");
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::TaskSource;

    fn task(title: &str, confidence: f32) -> GeneratedTask {
        let source = TaskSource {
            sentence: title.into(),
            section: "Document".into(),
            offset: [0, title.len()],
            line_number: 1,
        };
        let mut t = GeneratedTask::new(title.into(), "Some description.".into(), source);
        t.confidence = confidence;
        t
    }

    #[test]
    fn script_detection() {
        assert_eq!(detect_script("Users must log in"), Script::Latin);
        assert_eq!(detect_script("Hệ thống phải hỗ trợ đăng nhập"), Script::Diacritic);
        assert_eq!(detect_script(""), Script::Latin);
    }

    #[test]
    fn latin_thresholds() {
        let config = PostProcessConfig::default();
        let kept = filter_low_quality(
            vec![
                task("Short", 0.9),
                task("Export audit logs", 0.25),
                task("Export audit logs", 0.3),
            ],
            &config,
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].confidence, 0.3);
    }

    #[test]
    fn diacritic_thresholds_are_looser() {
        let config = PostProcessConfig::default();
        let kept = filter_low_quality(vec![task("Đăng nhập", 0.25)], &config);
        assert_eq!(kept.len(), 1);
        let kept = filter_low_quality(vec![task("Đăng nhập", 0.15)], &config);
        assert!(kept.is_empty());
    }

    #[test]
    fn unknown_as_a_plain_word_is_kept() {
        let config = PostProcessConfig::default();
        let mut described = task("Validate uploaded attachments", 0.9);
        described.description = "Files of unknown type are rejected before storage.".into();
        let kept = filter_low_quality(
            vec![task("Reject unknown file types", 0.9), described, task("Flag unknown senders in inbox", 0.9)],
            &config,
        );
        assert_eq!(kept.len(), 3);
    }

    #[test]
    fn placeholder_and_generic_titles_are_dropped() {
        let config = PostProcessConfig::default();
        let kept = filter_low_quality(
            vec![
                task("Unknown", 0.9),
                task("Implement export for unknown", 0.9),
                task("Implement implement things", 0.9),
                task("Implement  ", 0.9),
            ],
            &config,
        );
        assert!(kept.is_empty());
    }

    #[test]
    fn interface_criteria_removed_from_backend_tasks() {
        let mut t = task("Export audit logs to CSV", 0.9);
        t.acceptance_criteria = vec![
            "CSV includes all columns".into(),
            "Screen meets WCAG 2.1 AA".into(),
            "Layout is responsive on mobile".into(),
        ];
        assert_eq!(strip_interface_criteria(&mut t), 2);
        assert_eq!(t.acceptance_criteria, vec!["CSV includes all columns".to_string()]);

        let mut ui = task("Design export screen", 0.9);
        ui.task_type = "interface".into();
        ui.acceptance_criteria = vec!["Screen meets WCAG 2.1 AA".into()];
        assert_eq!(strip_interface_criteria(&mut ui), 0);
    }
}
