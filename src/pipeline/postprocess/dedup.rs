use crate::models::task::GeneratedTask;
use crate::pipeline::generation::common::dedupe_criteria;

use super::similarity::TermVector;

/// Collapse near-duplicate tasks.
///
/// Candidates are considered in descending confidence (earlier first on
/// ties) and kept only when they stay below `threshold` against every task
/// already kept. Survivors are returned in their original order, and since
/// they are pairwise below the threshold a second pass keeps all of them.
pub fn deduplicate(tasks: Vec<GeneratedTask>, threshold: f32) -> Vec<GeneratedTask> {
    let mut tasks: Vec<GeneratedTask> = tasks
        .into_iter()
        .map(|mut task| {
            task.acceptance_criteria = dedupe_criteria(std::mem::take(&mut task.acceptance_criteria));
            task
        })
        .collect();

    let vectors: Vec<TermVector> = tasks.iter().map(TermVector::from_task).collect();
    let mut order: Vec<usize> = (0..tasks.len()).collect();
    order.sort_by(|&a, &b| {
        tasks[b]
            .confidence
            .total_cmp(&tasks[a].confidence)
            .then(a.cmp(&b))
    });

    let mut kept: Vec<usize> = Vec::with_capacity(tasks.len());
    for candidate in order {
        let duplicate_of = kept
            .iter()
            .copied()
            .find(|&k| vectors[candidate].cosine(&vectors[k]) >= threshold);
        match duplicate_of {
            Some(k) => tracing::debug!(
                dropped = %tasks[candidate].title,
                kept = %tasks[k].title,
                "Collapsed duplicate task"
            ),
            None => kept.push(candidate),
        }
    }
    kept.sort_unstable();

    let removed = tasks.len() - kept.len();
    let mut keep = vec![false; tasks.len()];
    for index in kept {
        keep[index] = true;
    }
    let mut flags = keep.into_iter();
    tasks.retain(|_| flags.next().unwrap_or(false));

    tracing::info!(removed, remaining = tasks.len(), threshold, "Deduplication complete");
    tasks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::TaskSource;

    fn task(title: &str, description: &str, confidence: f32) -> GeneratedTask {
        let source = TaskSource {
            sentence: title.into(),
            section: "Document".into(),
            offset: [0, 0],
            line_number: 1,
        };
        let mut t = GeneratedTask::new(title.into(), description.into(), source);
        t.confidence = confidence;
        t
    }

    #[test]
    fn identical_tasks_collapse_to_higher_confidence() {
        let tasks = vec![
            task("Log in with email and password", "The system needs to log in.", 0.6),
            task("Log in with email and password", "The system needs to log in.", 0.8),
        ];
        let result = deduplicate(tasks, 0.85);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].confidence, 0.8);
    }

    #[test]
    fn earlier_task_wins_ties() {
        let first = task("Export audit logs to CSV", "Export the logs.", 0.7);
        let first_id = first.task_id;
        let result = deduplicate(
            vec![first, task("Export audit logs to CSV", "Export the logs.", 0.7)],
            0.85,
        );
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].task_id, first_id);
    }

    #[test]
    fn distinct_tasks_survive_in_order() {
        let tasks = vec![
            task("Export audit logs to CSV", "Admins export logs.", 0.5),
            task("Reset password via email", "Users reset passwords.", 0.9),
            task("Render sales dashboard", "Managers view charts.", 0.7),
        ];
        let result = deduplicate(tasks, 0.85);
        let titles: Vec<&str> = result.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Export audit logs to CSV", "Reset password via email", "Render sales dashboard"]
        );
    }

    #[test]
    fn deduplication_is_idempotent() {
        let tasks = vec![
            task("Export audit logs to CSV", "Export the audit logs as CSV.", 0.6),
            task("Export audit logs to CSV file", "Export the audit logs as a CSV file.", 0.7),
            task("Export audit log entries to CSV", "Export audit log entries as CSV.", 0.65),
            task("Reset password via email", "Users reset passwords.", 0.9),
            task("Reset passwords via email link", "Users reset their passwords.", 0.5),
        ];
        let once = deduplicate(tasks, 0.85);
        let ids: Vec<_> = once.iter().map(|t| t.task_id).collect();
        let twice = deduplicate(once, 0.85);
        assert_eq!(twice.iter().map(|t| t.task_id).collect::<Vec<_>>(), ids);
    }

    #[test]
    fn criteria_are_deduplicated_per_task() {
        let mut t = task("Export audit logs to CSV", "Export.", 0.9);
        t.acceptance_criteria = vec!["CSV has headers".into(), "csv has headers".into(), "Rows match".into()];
        let result = deduplicate(vec![t], 0.85);
        assert_eq!(result[0].acceptance_criteria, vec!["CSV has headers", "Rows match"]);
    }
}
