use crate::models::task::GeneratedTask;
use crate::pipeline::generation::common::{dedupe_criteria, MAX_CRITERIA};

pub const MIN_CRITERIA: usize = 3;

fn generic_criteria(task: &GeneratedTask) -> [String; 3] {
    [
        format!("Behaviour matches the requirement: \"{}\"", task.source.sentence.trim()),
        "Automated tests cover the success path and at least one failure path".to_string(),
        "Changes are reviewed and documented before release".to_string(),
    ]
}

/// De-duplicate, cap at [`MAX_CRITERIA`], then pad with generic checks until
/// at least [`MIN_CRITERIA`] remain.
pub fn normalize_task_criteria(task: &mut GeneratedTask) {
    let mut criteria = dedupe_criteria(std::mem::take(&mut task.acceptance_criteria));
    criteria.truncate(MAX_CRITERIA);
    for generic in generic_criteria(task) {
        if criteria.len() >= MIN_CRITERIA {
            break;
        }
        if !criteria.iter().any(|c| c.eq_ignore_ascii_case(&generic)) {
            criteria.push(generic);
        }
    }
    task.acceptance_criteria = criteria;
}

pub fn normalize_criteria(mut tasks: Vec<GeneratedTask>) -> Vec<GeneratedTask> {
    for task in &mut tasks {
        normalize_task_criteria(task);
    }
    tasks
}
