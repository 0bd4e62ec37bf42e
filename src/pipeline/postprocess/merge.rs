use crate::models::enums::Role;
use crate::models::task::GeneratedTask;
use crate::pipeline::generation::common::dedupe_criteria;

use super::similarity::TermVector;

pub const MERGED_CRITERIA_CAP: usize = 10;
pub const MERGED_LABEL: &str = "merged";

/// Fold related (but not duplicate) tasks of the same type, role and domain.
///
/// Within a group the first unmerged task is the base; every later member
/// whose similarity to the base lies in `[merge_threshold, dedupe_threshold)`
/// folds into it. The merged task keeps the base's position.
pub fn merge_related_tasks(
    tasks: Vec<GeneratedTask>,
    merge_threshold: f32,
    dedupe_threshold: f32,
) -> Vec<GeneratedTask> {
    let vectors: Vec<TermVector> = tasks.iter().map(TermVector::from_task).collect();
    let key = |t: &GeneratedTask| -> (String, Role, String) { (t.task_type.clone(), t.role, t.domain.clone()) };

    // absorbed[i] = index of the base task i folds into
    let mut absorbed: Vec<Option<usize>> = vec![None; tasks.len()];
    let mut members: Vec<Vec<usize>> = vec![Vec::new(); tasks.len()];

    for base in 0..tasks.len() {
        if absorbed[base].is_some() {
            continue;
        }
        let base_key = key(&tasks[base]);
        for other in base + 1..tasks.len() {
            if absorbed[other].is_some() || key(&tasks[other]) != base_key {
                continue;
            }
            let similarity = vectors[base].cosine(&vectors[other]);
            if similarity >= merge_threshold && similarity < dedupe_threshold {
                absorbed[other] = Some(base);
                members[base].push(other);
            }
        }
    }

    let mut merged_count = 0usize;
    let mut slots: Vec<Option<GeneratedTask>> = tasks.into_iter().map(Some).collect();
    let mut out = Vec::with_capacity(slots.len());

    for index in 0..slots.len() {
        if absorbed[index].is_some() {
            continue;
        }
        let Some(mut base) = slots[index].take() else {
            continue;
        };
        let folded: Vec<GeneratedTask> = members[index]
            .iter()
            .filter_map(|&m| slots[m].take())
            .collect();
        if !folded.is_empty() {
            merged_count += folded.len();
            fold_into(&mut base, &folded);
        }
        out.push(base);
    }

    tracing::info!(merged = merged_count, remaining = out.len(), "Related task merge complete");
    out
}

fn fold_into(base: &mut GeneratedTask, others: &[GeneratedTask]) {
    let mut criteria = std::mem::take(&mut base.acceptance_criteria);
    for other in others {
        criteria.extend(other.acceptance_criteria.iter().cloned());
        if other.priority.rank() > base.priority.rank() {
            base.priority = other.priority;
        }
        base.confidence = base.confidence.min(other.confidence);
        for label in &other.labels {
            base.add_label(label);
        }
        for dep in &other.dependencies {
            if !base.dependencies.contains(dep) && *dep != base.task_id {
                base.dependencies.push(*dep);
            }
        }
    }
    let mut criteria = dedupe_criteria(criteria);
    criteria.truncate(MERGED_CRITERIA_CAP);
    base.acceptance_criteria = criteria;

    let titles: Vec<&str> = others.iter().map(|t| t.title.as_str()).collect();
    base.description = format!(
        "{} Consolidates related requirements: {}.",
        base.description.trim_end(),
        titles.join("; ")
    );
    base.add_label(MERGED_LABEL);
    tracing::debug!(base = %base.title, folded = others.len(), "Merged related tasks");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::Priority;
    use crate::models::task::TaskSource;

    fn task(title: &str, description: &str, priority: Priority, confidence: f32) -> GeneratedTask {
        let source = TaskSource {
            sentence: title.into(),
            section: "Reports".into(),
            offset: [0, 0],
            line_number: 1,
        };
        let mut t = GeneratedTask::new(title.into(), description.into(), source);
        t.priority = priority;
        t.confidence = confidence;
        t.acceptance_criteria = vec![format!("{title} works"), "Report totals are correct".into()];
        t
    }

    #[test]
    fn related_tasks_fold_into_first() {
        let a = task("Export monthly sales report", "Export the monthly sales report.", Priority::Medium, 0.8);
        let b = task("Export weekly sales report", "Export the weekly sales report.", Priority::High, 0.6);
        let sim = TermVector::from_task(&a).cosine(&TermVector::from_task(&b));
        let a_id = a.task_id;

        let out = merge_related_tasks(vec![a, b], sim - 0.01, sim + 0.01);
        assert_eq!(out.len(), 1);
        let merged = &out[0];
        assert_eq!(merged.task_id, a_id);
        assert_eq!(merged.priority, Priority::High);
        assert_eq!(merged.confidence, 0.6);
        assert_eq!(merged.acceptance_criteria.len(), 3);
        assert!(merged.description.contains("Consolidates related requirements: Export weekly sales report."));
        assert!(merged.labels.iter().any(|l| l == MERGED_LABEL));
    }

    #[test]
    fn duplicates_and_unrelated_are_left_alone() {
        let a = task("Export monthly sales report", "Export the monthly sales report.", Priority::Medium, 0.8);
        let same = task("Export monthly sales report", "Export the monthly sales report.", Priority::Medium, 0.7);
        let other = task("Reset password by email", "Users reset passwords.", Priority::Low, 0.9);
        let out = merge_related_tasks(vec![a, same, other], 0.70, 0.85);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn different_roles_never_merge() {
        let a = task("Export monthly sales report", "Export the monthly sales report.", Priority::Medium, 0.8);
        let mut b = task("Export weekly sales report", "Export the weekly sales report.", Priority::Medium, 0.8);
        b.role = Role::Frontend;
        let out = merge_related_tasks(vec![a, b], 0.0, 1.01);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn merged_criteria_are_capped() {
        let mut a = task("Export monthly sales report", "Export the monthly sales report.", Priority::Medium, 0.8);
        let mut b = task("Export weekly sales report", "Export the weekly sales report.", Priority::Medium, 0.8);
        a.acceptance_criteria = (0..7).map(|i| format!("A{i}")).collect();
        b.acceptance_criteria = (0..7).map(|i| format!("B{i}")).collect();
        let out = merge_related_tasks(vec![a, b], 0.0, 1.01);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].acceptance_criteria.len(), MERGED_CRITERIA_CAP);
    }
}
