use sha2::{Digest, Sha256};

use crate::models::task::{GeneratedTask, TaskSource};
use crate::pipeline::classify::{EnrichmentResult, RoleAssigner};
use crate::pipeline::segment::{Sentence, DEFAULT_SECTION};

use super::overrides::{security_override, KEYWORD_OVERRIDE_LABEL};

pub const MAX_TITLE_CHARS: usize = 100;
pub const MAX_CRITERIA: usize = 7;
const STORY_POINT_CAP: u32 = 8;

/// Title, description and criteria produced by a strategy before the shared
/// classification fields are attached.
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub acceptance_criteria: Vec<String>,
}

/// Cut titles over the limit to 97 characters plus "...".
pub fn clamp_title(title: &str) -> String {
    let title = title.split_whitespace().collect::<Vec<_>>().join(" ");
    if title.chars().count() <= MAX_TITLE_CHARS {
        return title;
    }
    let cut: String = title.chars().take(MAX_TITLE_CHARS - 3).collect();
    format!("{}...", cut.trim_end())
}

pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Case-insensitive de-duplication preserving first occurrence.
pub fn dedupe_criteria(criteria: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    criteria
        .into_iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty() && seen.insert(c.to_lowercase()))
        .collect()
}

/// Base points by type, +1 at four criteria, +2 at six, capped at 8.
pub fn estimate_story_points(req_type: &str, criteria: usize) -> u32 {
    let base = match req_type {
        "security" | "data" | "performance" | "integration" => 5,
        _ => 3,
    };
    let bonus = match criteria {
        n if n >= 6 => 2,
        n if n >= 4 => 1,
        _ => 0,
    };
    (base + bonus).min(STORY_POINT_CAP)
}

/// Section title as module name; the implicit section has none.
pub fn module_for(section: &str) -> Option<String> {
    let section = section.trim();
    (!section.is_empty() && section != DEFAULT_SECTION).then(|| section.to_string())
}

/// Stable variant index for `key` in `0..len`.
pub fn variant_index(key: &str, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let digest = Sha256::digest(key.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    (u64::from_le_bytes(bytes) % len as u64) as usize
}

/// Labels after the security keyword rule, with the role re-derived for the
/// forced type. The flag tells whether the rule fired.
pub fn apply_overrides(text: &str, labels: &EnrichmentResult) -> (EnrichmentResult, bool) {
    match security_override(text, labels) {
        Some(mut forced) => {
            forced.role = RoleAssigner::new().assign(text, &forced.req_type);
            (forced, true)
        }
        None => (labels.clone(), false),
    }
}

/// Attach classification fields to a draft and enforce per-task limits.
pub fn assemble_task(
    draft: TaskDraft,
    sentence: &Sentence,
    labels: &EnrichmentResult,
    epic: Option<&str>,
    overridden: bool,
) -> GeneratedTask {
    let title = match clamp_title(&draft.title) {
        t if t.is_empty() => clamp_title(&format!("Implement: {}", sentence.text)),
        t => t,
    };
    let description = if draft.description.trim().is_empty() {
        format!("Requirement: {}", sentence.text.trim())
    } else {
        draft.description.trim().to_string()
    };
    let mut criteria = dedupe_criteria(draft.acceptance_criteria);
    criteria.truncate(MAX_CRITERIA);
    if criteria.is_empty() {
        criteria.push(format!("Behaviour matches the requirement: \"{}\"", sentence.text.trim()));
    }

    let mut task = GeneratedTask::new(title, description, TaskSource::from(sentence));
    task.epic = epic.map(str::to_string);
    task.module = module_for(&sentence.section);
    task.task_type = labels.req_type.clone();
    task.priority = labels.priority;
    task.domain = labels.domain.clone();
    task.role = labels.role;
    task.set_confidence(labels.confidence);
    task.set_story_points(estimate_story_points(&labels.req_type, criteria.len()));
    task.acceptance_criteria = criteria;

    task.add_label(&labels.req_type);
    task.add_label(labels.priority.as_str());
    task.add_label(&labels.domain);
    if overridden {
        task.add_label(KEYWORD_OVERRIDE_LABEL);
    }
    task
}

#[cfg(test)]
pub(crate) fn sentence(text: &str) -> Sentence {
    Sentence {
        text: text.to_string(),
        section: DEFAULT_SECTION.to_string(),
        start: 0,
        end: text.chars().count(),
        line_number: 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::{Complexity, Priority, Role};

    #[test]
    fn long_titles_are_cut() {
        let long = "word ".repeat(40);
        let title = clamp_title(&long);
        assert!(title.chars().count() <= MAX_TITLE_CHARS);
        assert!(title.ends_with("..."));
        assert_eq!(clamp_title("  Export   logs "), "Export logs");
    }

    #[test]
    fn story_points_follow_type_and_criteria() {
        assert_eq!(estimate_story_points("functional", 3), 3);
        assert_eq!(estimate_story_points("functional", 4), 4);
        assert_eq!(estimate_story_points("security", 6), 7);
        assert_eq!(estimate_story_points("data", 7), 7);
        assert_eq!(estimate_story_points("unknown-type", 0), 3);
    }

    #[test]
    fn module_skips_implicit_section() {
        assert_eq!(module_for("Document"), None);
        assert_eq!(module_for("Authentication"), Some("Authentication".into()));
    }

    #[test]
    fn variant_choice_is_stable() {
        let a = variant_index("export|audit logs|data", 4);
        assert_eq!(a, variant_index("export|audit logs|data", 4));
        assert!(a < 4);
        assert_eq!(variant_index("anything", 0), 0);
    }

    #[test]
    fn assemble_applies_labels_and_limits() {
        let s = sentence("Admins must export audit logs.");
        let labels = EnrichmentResult {
            priority: Priority::High,
            ..EnrichmentResult::fallback()
        };
        let draft = TaskDraft {
            title: "Export audit logs".into(),
            description: "Export the audit logs.".into(),
            acceptance_criteria: (0..10).map(|i| format!("Criterion {i}")).collect(),
        };
        let task = assemble_task(draft, &s, &labels, Some("Compliance"), false);
        assert_eq!(task.acceptance_criteria.len(), MAX_CRITERIA);
        assert_eq!(task.story_points, 5);
        assert_eq!(task.complexity, Complexity::Medium);
        assert_eq!(task.epic.as_deref(), Some("Compliance"));
        assert_eq!(task.module, None);
        assert_eq!(task.role, Role::Backend);
        assert_eq!(task.labels, vec!["functional", "High", "general"]);
        assert_eq!(task.source.sentence, s.text);
    }

    #[test]
    fn empty_draft_gets_defaults() {
        let s = sentence("Something must happen.");
        let task = assemble_task(TaskDraft::default(), &s, &EnrichmentResult::fallback(), None, true);
        assert_eq!(task.title, "Implement: Something must happen.");
        assert_eq!(task.description, "Requirement: Something must happen.");
        assert_eq!(task.acceptance_criteria.len(), 1);
        assert!(task.labels.iter().any(|l| l == KEYWORD_OVERRIDE_LABEL));
    }
}
