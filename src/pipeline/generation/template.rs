//! Slot-filling strategy: one fixed template set per requirement type.

use crate::models::enums::{GenerationMode, Role};
use crate::models::task::GeneratedTask;
use crate::pipeline::classify::EnrichmentResult;
use crate::pipeline::segment::Sentence;

use super::common::{apply_overrides, assemble_task, capitalize, module_for, TaskDraft};
use super::extract::{ExtractionCache, RuleBasedExtractor};
use super::{GenerationError, TaskGenerator};

/// Filled slots for one sentence.
struct Slots {
    action: String,
    object: String,
    /// Leading space included when present.
    condition: String,
}

impl Slots {
    fn fill(&self, template: &str) -> String {
        template
            .replace("{Action}", &capitalize(&self.action))
            .replace("{action}", &self.action)
            .replace("{object}", &self.object)
            .replace("{condition}", &self.condition)
    }
}

struct TemplateSet {
    title: &'static str,
    description: &'static str,
    criteria: &'static [&'static str],
}

const FUNCTIONAL: TemplateSet = TemplateSet {
    title: "Implement {action} for {object}",
    description: "The system needs to {action} {object}{condition}.",
    criteria: &[
        "User can {action} {object} successfully",
        "Input is validated before the system attempts to {action} {object}",
        "The user receives clear feedback once {object} is processed",
        "Failures while trying to {action} {object} are reported with a helpful message",
    ],
};

const SECURITY: TemplateSet = TemplateSet {
    title: "Enforce secure {action} for {object}",
    description: "Apply security controls so the system can {action} {object}{condition}.",
    criteria: &[
        "Sensitive {object} data is protected in transit and at rest",
        "Only authorized roles can {action} {object}",
        "Every attempt to {action} {object} is written to the audit log",
        "Known vulnerabilities for this flow are reviewed and addressed",
    ],
};

const INTERFACE: TemplateSet = TemplateSet {
    title: "Design {object} UI for {action}",
    description: "Provide a user interface that lets users {action} {object}{condition}.",
    criteria: &[
        "The {object} screen follows the approved design",
        "Users can {action} {object} from the interface without guidance",
        "The layout is responsive on desktop, tablet and mobile",
        "The screen meets WCAG 2.1 AA accessibility guidelines",
    ],
};

const DATA: TemplateSet = TemplateSet {
    title: "Implement {object} data management",
    description: "Store and manage {object} so the system can {action} it{condition}.",
    criteria: &[
        "The data model covers every {object} attribute",
        "Create, read, update and delete work for {object}",
        "{object} data is validated before it is persisted",
        "Queries on {object} are indexed",
    ],
};

const PERFORMANCE: TemplateSet = TemplateSet {
    title: "Optimize {object} {action} performance",
    description: "Make sure the system can {action} {object} within agreed response times{condition}.",
    criteria: &[
        "Requests to {action} {object} complete within 2 seconds at the 95th percentile",
        "Performance holds under the expected peak load",
        "Response times for {object} are monitored and alerted on",
    ],
};

const INTEGRATION: TemplateSet = TemplateSet {
    title: "Integrate {object} {action} with external systems",
    description: "Connect the system to the external service used to {action} {object}{condition}.",
    criteria: &[
        "The integration can {action} {object} end to end",
        "Transient failures of the external service are retried",
        "Integration errors are logged with enough context to diagnose them",
    ],
};

const DEFAULT: TemplateSet = TemplateSet {
    title: "{Action} {object}",
    description: "The system should {action} {object}{condition}.",
    criteria: &[
        "The system can {action} {object} as described",
        "Edge cases around {object} are handled",
        "The behaviour is covered by automated tests",
    ],
};

fn template_set(req_type: &str) -> &'static TemplateSet {
    match req_type {
        "functional" => &FUNCTIONAL,
        "security" => &SECURITY,
        "interface" => &INTERFACE,
        "data" => &DATA,
        "performance" => &PERFORMANCE,
        "integration" => &INTEGRATION,
        _ => &DEFAULT,
    }
}

fn role_test_criterion(role: Role, slots: &Slots) -> String {
    let template = match role {
        Role::Frontend => "UI tests cover the {object} interactions",
        Role::Backend => "Unit and integration tests cover the {action} logic",
        Role::Security => "Security tests verify the controls around {object}",
        Role::QA => "Test cases cover the happy path and failure cases for {object}",
        Role::DevOps => "Deployment and monitoring checks cover {object}",
        Role::BA => "Business stakeholders sign off on the {object} behaviour",
    };
    slots.fill(template)
}

/// Deterministic template generator over the basic extraction profile.
#[derive(Debug, Clone)]
pub struct TemplateGenerator {
    extractor: RuleBasedExtractor,
}

impl Default for TemplateGenerator {
    fn default() -> Self {
        Self {
            extractor: RuleBasedExtractor::basic(),
        }
    }
}

impl TemplateGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TaskGenerator for TemplateGenerator {
    fn mode(&self) -> GenerationMode {
        GenerationMode::Template
    }

    fn generate_one(
        &self,
        sentence: &Sentence,
        labels: &EnrichmentResult,
        epic: Option<&str>,
        cache: &mut ExtractionCache,
    ) -> Result<GeneratedTask, GenerationError> {
        let extraction = cache.get_or_extract(&self.extractor, &sentence.text);
        let (labels, overridden) = apply_overrides(&sentence.text, labels);

        let condition = extraction
            .condition
            .clone()
            .or_else(|| extraction.modifiers.first().cloned())
            .map(|c| format!(" {c}"))
            .unwrap_or_default();
        let slots = Slots {
            action: extraction.action.clone(),
            object: extraction.object_or_actor(),
            condition,
        };

        let set = template_set(&labels.req_type);
        let mut criteria: Vec<String> = set.criteria.iter().map(|c| capitalize(&slots.fill(c))).collect();
        criteria.push(format!(
            "Behaviour matches the requirement: \"{}\"",
            sentence.text.trim()
        ));
        criteria.push(role_test_criterion(labels.role, &slots));

        let mut description = slots.fill(set.description);
        if let Some(module) = module_for(&sentence.section) {
            description.push_str(&format!(" Section: {module}."));
        }

        let draft = TaskDraft {
            title: capitalize(&slots.fill(set.title)),
            description,
            acceptance_criteria: criteria,
        };
        Ok(assemble_task(draft, sentence, &labels, epic, overridden))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::Priority;
    use crate::pipeline::generation::common::sentence;

    fn generate(text: &str, labels: &EnrichmentResult) -> GeneratedTask {
        let mut cache = ExtractionCache::new();
        TemplateGenerator::new()
            .generate_one(&sentence(text), labels, None, &mut cache)
            .unwrap()
    }

    #[test]
    fn functional_template_fills_slots() {
        let task = generate("Managers can export monthly reports to CSV.", &EnrichmentResult::fallback());
        assert_eq!(task.title, "Implement export for monthly reports");
        assert_eq!(task.description, "The system needs to export monthly reports to CSV.");
        assert_eq!(task.task_type, "functional");
        assert!(task
            .acceptance_criteria
            .iter()
            .any(|c| c.contains("Managers can export monthly reports to CSV.")));
    }

    #[test]
    fn security_keyword_forces_security_template() {
        let labels = EnrichmentResult::fallback().with_domain("finance");
        let task = generate("Password must be encrypted using bcrypt.", &labels);
        assert_eq!(task.task_type, "security");
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.domain, "general");
        assert_eq!(task.title, "Enforce secure encrypt for password");
        assert!(task.labels.iter().any(|l| l == "keyword-override"));
        assert_eq!(task.confidence, labels.confidence);
    }

    #[test]
    fn criteria_stay_within_limits() {
        let task = generate("The dashboard page must display totals.", &EnrichmentResult::fallback());
        assert!((1..=7).contains(&task.acceptance_criteria.len()));
        assert!(!task.title.is_empty());
        assert!(!task.description.is_empty());
    }

    #[test]
    fn unknown_type_uses_default_templates() {
        let labels = EnrichmentResult {
            req_type: "usability".into(),
            ..EnrichmentResult::fallback()
        };
        let task = generate("Users should sort results by date.", &labels);
        assert_eq!(task.title, "Sort results");
        assert_eq!(task.story_points, 5);
    }

    #[test]
    fn section_feeds_module_and_description() {
        let mut s = sentence("Users must upload receipts.");
        s.section = "Expenses".into();
        let mut cache = ExtractionCache::new();
        let task = TemplateGenerator::new()
            .generate_one(&s, &EnrichmentResult::fallback(), Some("Finance"), &mut cache)
            .unwrap();
        assert_eq!(task.module.as_deref(), Some("Expenses"));
        assert!(task.description.ends_with("Section: Expenses."));
        assert_eq!(task.epic.as_deref(), Some("Finance"));
    }
}
