//! Break full-stack functional tasks into Backend → Frontend → Testing.

use std::sync::LazyLock;

use regex::Regex;
use uuid::Uuid;

use crate::models::enums::{Priority, Role};
use crate::models::task::GeneratedTask;
use crate::pipeline::generation::common::{clamp_title, dedupe_criteria, estimate_story_points, MAX_CRITERIA};

pub const SUBTASK_LABEL: &str = "subtask";
const MIN_DESCRIPTIVE_WORDS: usize = 4;
const TESTING_CONFIDENCE_FACTOR: f32 = 0.95;

static UI_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(ui|page|screen|form|button|dashboard|view|display|modal|menu|upload|giao diện|màn hình)\b")
        .unwrap()
});

static BACKEND_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(api|endpoint|database|store|save|persist|server|service|process|validate|export|import|sync)\w*\b")
        .unwrap()
});

/// Functional work that is either Medium/High with a descriptive title, or
/// titled with both a UI surface and backend work (any priority).
pub fn should_split(task: &GeneratedTask) -> bool {
    if task.task_type != "functional" || task.labels.iter().any(|l| l == SUBTASK_LABEL) {
        return false;
    }
    let descriptive = matches!(task.priority, Priority::Medium | Priority::High)
        && task.title.split_whitespace().count() >= MIN_DESCRIPTIVE_WORDS;
    let full_stack = UI_KEYWORDS.is_match(&task.title) && BACKEND_KEYWORDS.is_match(&task.title);
    descriptive || full_stack
}

struct Part {
    prefix: &'static str,
    role: Role,
    description: &'static str,
    criteria: [&'static str; 3],
}

const BACKEND: Part = Part {
    prefix: "Backend",
    role: Role::Backend,
    description: "Implement the server-side logic, data access and API surface for this feature.",
    criteria: [
        "API endpoint accepts valid input and returns the documented response",
        "Invalid input is rejected with a descriptive error",
        "State changes are persisted and covered by unit tests",
    ],
};

const FRONTEND: Part = Part {
    prefix: "Frontend",
    role: Role::Frontend,
    description: "Build the user-facing screens and wire them to the backend API.",
    criteria: [
        "Screen renders the data returned by the API",
        "User input is validated before submission",
        "Errors from the API are shown to the user",
    ],
};

const TESTING: Part = Part {
    prefix: "Testing",
    role: Role::QA,
    description: "Verify the feature end to end across backend and frontend.",
    criteria: [
        "End-to-end test covers the main success path",
        "Edge cases and error paths are covered by tests",
        "Regression suite passes with the feature enabled",
    ],
};

fn subtask(parent: &GeneratedTask, part: &Part, extra_criteria: &[String]) -> GeneratedTask {
    let mut task = parent.clone();
    task.task_id = Uuid::new_v4();
    task.title = clamp_title(&format!("{}: {}", part.prefix, parent.title));
    task.description = format!("{} {}", part.description, parent.description.trim());
    task.role = part.role;
    task.dependencies = Vec::new();

    let mut criteria: Vec<String> = part.criteria.iter().map(|c| c.to_string()).collect();
    criteria.extend(extra_criteria.iter().cloned());
    let mut criteria = dedupe_criteria(criteria);
    criteria.truncate(MAX_CRITERIA);
    task.acceptance_criteria = criteria;

    task.set_story_points(estimate_story_points(&task.task_type, task.acceptance_criteria.len()));
    task.add_label(SUBTASK_LABEL);
    task
}

/// The three subtasks for `parent`, dependencies already linked.
pub fn split_task(parent: &GeneratedTask) -> [GeneratedTask; 3] {
    let backend = subtask(parent, &BACKEND, &parent.acceptance_criteria);

    let mut frontend = subtask(parent, &FRONTEND, &[]);
    frontend.dependencies = vec![backend.task_id];

    let mut testing = subtask(parent, &TESTING, &[]);
    testing.priority = Priority::Medium;
    testing.set_confidence(parent.confidence * TESTING_CONFIDENCE_FACTOR);
    testing.dependencies = vec![backend.task_id, frontend.task_id];

    [backend, frontend, testing]
}

pub fn split_complex_tasks(tasks: Vec<GeneratedTask>) -> Vec<GeneratedTask> {
    let mut out = Vec::with_capacity(tasks.len());
    let mut split = 0usize;
    for task in tasks {
        if should_split(&task) {
            tracing::debug!(title = %task.title, "Splitting task into subtasks");
            out.extend(split_task(&task));
            split += 1;
        } else {
            out.push(task);
        }
    }
    tracing::info!(split, total = out.len(), "Complex task split complete");
    out
}
