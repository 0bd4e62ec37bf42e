//! Phrase-level strategy over the refined extraction profile.
//!
//! Titles are built from the resolved verb phrase ("Export audit logs to
//! CSV") rather than from a fixed template. Description and criteria wording
//! varies per requirement, but the variant is picked by hashing the extracted
//! (action, object, type) key, so the same requirement always reads the same
//! and paraphrases of one requirement converge on identical text.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::enums::{GenerationMode, Priority};
use crate::models::task::GeneratedTask;
use crate::pipeline::classify::EnrichmentResult;
use crate::pipeline::segment::Sentence;

use super::common::{apply_overrides, assemble_task, capitalize, variant_index, TaskDraft};
use super::extract::{Extraction, ExtractionCache, RuleBasedExtractor};
use super::overrides::is_low_signal;
use super::{GenerationError, TaskGenerator};

static GENERIC_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^((implement|add|build|support)\s+(the\s+)?(system|application|platform|feature|functionality|requirement)|(system|application)\s+\w+)$",
    )
    .unwrap()
});

const INSTRUMENT_PREPS: &[&str] = &["with", "via", "by"];

/// Rendered phrases shared by the title, description and criteria.
struct Phrasing {
    action: String,
    object: String,
    /// "export audit logs", "log in".
    verb_phrase: String,
    /// " to CSV" plus the instrument phrase, leading space included.
    title_tail: String,
    /// Every modifier and the condition, leading space included.
    full_tail: String,
    key: String,
}

impl Phrasing {
    fn new(extraction: &Extraction, req_type: &str) -> Self {
        let action = extraction.action.clone();
        let verb_phrase = if extraction.fallback && extraction.object.is_empty() {
            "implement the requirement".to_string()
        } else {
            extraction.verb_phrase()
        };

        let format = extraction
            .format
            .as_ref()
            .map(|f| {
                let prep = match action.as_str() {
                    "export" | "convert" | "send" | "push" | "publish" => "to",
                    _ => "as",
                };
                format!(" {prep} {f}")
            })
            .unwrap_or_default();
        let instrument = extraction
            .modifiers
            .iter()
            .find(|m| INSTRUMENT_PREPS.iter().any(|p| m.starts_with(&format!("{p} "))))
            .map(|m| format!(" {m}"))
            .unwrap_or_default();

        let mut full_tail = format.clone();
        for modifier in &extraction.modifiers {
            full_tail.push(' ');
            full_tail.push_str(modifier);
        }
        if let Some(condition) = &extraction.condition {
            full_tail.push(' ');
            full_tail.push_str(condition);
        }

        Self {
            key: format!("{}|{}|{}", action, extraction.object.to_lowercase(), req_type),
            object: extraction.object_or_actor(),
            title_tail: format!("{format}{instrument}"),
            full_tail,
            verb_phrase,
            action,
        }
    }

    fn fill(&self, template: &str) -> String {
        template
            .replace("{Vp}", &capitalize(&self.verb_phrase))
            .replace("{vp}", &self.verb_phrase)
            .replace("{action}", &self.action)
            .replace("{Object}", &capitalize(&self.object))
            .replace("{object}", &self.object)
            .replace("{tail}", &self.full_tail)
    }

    fn pick(&self, salt: &str, variants: &[&str]) -> String {
        let index = variant_index(&format!("{}#{salt}", self.key), variants.len());
        self.fill(variants[index])
    }
}

/// (theme, variants) pairs per requirement type.
type Themes = &'static [(&'static str, &'static [&'static str])];

const FUNCTIONAL_THEMES: Themes = &[
    (
        "outcome",
        &["A user can {vp}{tail} successfully", "{Vp}{tail} works end to end"],
    ),
    (
        "validation",
        &[
            "Input is validated before the system tries to {vp}",
            "Invalid input for {object} is rejected with a clear message",
        ],
    ),
    (
        "errors",
        &[
            "Errors while trying to {action} are handled gracefully",
            "A failed attempt to {vp} leaves data in a consistent state",
        ],
    ),
    (
        "feedback",
        &[
            "The user is told when the {action} step completes",
            "Progress and completion of {action} are visible to the user",
        ],
    ),
];

const SECURITY_THEMES: Themes = &[
    (
        "authentication",
        &[
            "Authentication is required before {action}",
            "Unauthenticated requests to {action} are rejected",
        ],
    ),
    (
        "authorization",
        &[
            "Only authorized roles can {vp}",
            "Permission checks run on every {action} request",
        ],
    ),
    (
        "encryption",
        &[
            "{Object} data is encrypted in transit and at rest",
            "Secrets involved in {action} are never stored in plain text",
        ],
    ),
    (
        "audit",
        &[
            "Every {action} attempt is recorded in the audit log",
            "Audit entries for {action} include the user and a timestamp",
        ],
    ),
];

const INTERFACE_THEMES: Themes = &[
    (
        "usability",
        &[
            "Users can {vp} without training",
            "The screen to {vp} follows the approved design",
        ],
    ),
    (
        "responsiveness",
        &[
            "The UI is responsive on desktop, tablet and mobile",
            "The layout adapts to small screens without horizontal scrolling",
        ],
    ),
    (
        "accessibility",
        &[
            "The screen meets WCAG 2.1 AA accessibility guidelines",
            "All controls support keyboard navigation",
        ],
    ),
    (
        "loading",
        &[
            "A loading state is shown while {object} loads",
            "Empty and error states for {object} are displayed clearly",
        ],
    ),
];

const DATA_THEMES: Themes = &[
    (
        "schema",
        &[
            "The data model covers every {object} attribute",
            "Schema changes for {object} ship with a migration",
        ],
    ),
    (
        "crud",
        &[
            "Create, read, update and delete work for {object}",
            "{Object} records can be stored and retrieved reliably",
        ],
    ),
    (
        "validation",
        &[
            "{Object} data is validated before it is persisted",
            "Invalid {object} records are rejected with a reason",
        ],
    ),
    (
        "indexing",
        &[
            "Queries on {object} are indexed",
            "{Object} data is included in the backup schedule",
        ],
    ),
];

const PERFORMANCE_THEMES: Themes = &[
    (
        "latency",
        &[
            "Requests to {vp} complete within 2 seconds at the 95th percentile",
            "Response time to {vp} stays under the agreed target",
        ],
    ),
    (
        "load",
        &[
            "Performance holds under the expected peak load",
            "A load test for {action} passes at twice the expected traffic",
        ],
    ),
    (
        "monitoring",
        &[
            "Latency for {action} is monitored and alerted on",
            "Dashboards show throughput and error rate for {action}",
        ],
    ),
];

const INTEGRATION_THEMES: Themes = &[
    (
        "contract",
        &[
            "The integration can {vp}{tail} end to end",
            "Requests and responses follow the agreed contract",
        ],
    ),
    (
        "resilience",
        &[
            "Transient failures of the external service are retried",
            "Timeouts from the external service do not block users",
        ],
    ),
    (
        "errors",
        &[
            "Integration errors are logged with enough context to diagnose them",
            "Errors from the external service map to clear user-facing messages",
        ],
    ),
];

fn themes_for(req_type: &str) -> Themes {
    match req_type {
        "security" => SECURITY_THEMES,
        "interface" => INTERFACE_THEMES,
        "data" => DATA_THEMES,
        "performance" => PERFORMANCE_THEMES,
        "integration" => INTEGRATION_THEMES,
        _ => FUNCTIONAL_THEMES,
    }
}

fn description_starters(req_type: &str) -> &'static [&'static str] {
    match req_type {
        "security" => &[
            "Add security controls so the system can {vp}{tail}.",
            "Secure the flow used to {vp}{tail}.",
            "Harden the system so it can safely {vp}{tail}.",
        ],
        "interface" => &[
            "Build the screens that let users {vp}{tail}.",
            "Design and implement the user interface to {vp}{tail}.",
        ],
        "data" => &[
            "Implement the data layer needed to {vp}{tail}.",
            "Set up storage and data management to {vp}{tail}.",
        ],
        "performance" => &[
            "Make sure the system can {vp}{tail} within target response times.",
            "Tune the system so it can {vp}{tail} quickly under load.",
        ],
        "integration" => &[
            "Integrate with the external service to {vp}{tail}.",
            "Connect the required external system to {vp}{tail}.",
        ],
        _ => &[
            "The system needs to {vp}{tail}.",
            "Implement the ability to {vp}{tail}.",
            "Provide functionality to {vp}{tail}.",
        ],
    }
}

fn type_context(req_type: &str) -> &'static str {
    match req_type {
        "security" => "Cover access control and encryption for this flow.",
        "interface" => "Keep the UI intuitive and accessible.",
        "data" => "Include data validation and error handling.",
        "performance" => "Measure the result against agreed targets.",
        "integration" => "Handle failures of the external dependency.",
        _ => "Include input validation and error handling.",
    }
}

/// Replace degenerate titles ("Implement implement ...", "System works").
fn repair_title(title: String, phrasing: &Phrasing) -> String {
    let words: Vec<String> = title.split_whitespace().map(str::to_lowercase).collect();
    if words.len() >= 2 && words[0] == words[1] {
        return format!("Implement {} capability", phrasing.object);
    }
    if GENERIC_TITLE.is_match(title.trim()) {
        return format!("{} {} functionality", capitalize(&phrasing.action), phrasing.object);
    }
    title
}

/// Deterministic generator over the refined extraction profile.
#[derive(Debug, Clone)]
pub struct ModelBasedGenerator {
    extractor: RuleBasedExtractor,
}

impl Default for ModelBasedGenerator {
    fn default() -> Self {
        Self {
            extractor: RuleBasedExtractor::refined(),
        }
    }
}

impl ModelBasedGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TaskGenerator for ModelBasedGenerator {
    fn mode(&self) -> GenerationMode {
        GenerationMode::ModelBased
    }

    fn generate_one(
        &self,
        sentence: &Sentence,
        labels: &EnrichmentResult,
        epic: Option<&str>,
        cache: &mut ExtractionCache,
    ) -> Result<GeneratedTask, GenerationError> {
        let extraction = cache.get_or_extract(&self.extractor, &sentence.text);
        let (mut labels, overridden) = apply_overrides(&sentence.text, labels);
        if !overridden && is_low_signal(&sentence.text) {
            labels.priority = Priority::Low;
        }

        let phrasing = Phrasing::new(&extraction, &labels.req_type);
        let title = capitalize(&format!("{}{}", phrasing.verb_phrase, phrasing.title_tail));
        let title = repair_title(title, &phrasing);

        let mut description = format!(
            "{} {}",
            phrasing.pick("description", description_starters(&labels.req_type)),
            type_context(&labels.req_type)
        );
        if labels.domain != "general" {
            description.push_str(&format!(" This supports {} operations.", labels.domain));
        }

        let criteria = themes_for(&labels.req_type)
            .iter()
            .map(|(theme, variants)| capitalize(&phrasing.pick(theme, variants)))
            .collect();

        let draft = TaskDraft {
            title,
            description,
            acceptance_criteria: criteria,
        };
        Ok(assemble_task(draft, sentence, &labels, epic, overridden))
    }
}
