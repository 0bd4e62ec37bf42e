//! Task list clean-up after generation.
//!
//! Stages run in a fixed order: quality filter, de-duplication, splitting of
//! full-stack tasks, optional merging of related tasks, and finally
//! acceptance-criteria normalization. Every stage except normalization can
//! be switched off.

pub mod similarity;
pub mod quality;
pub mod dedup;
pub mod split;
pub mod merge;
pub mod criteria;

pub use criteria::normalize_criteria;
pub use dedup::deduplicate;
pub use merge::merge_related_tasks;
pub use quality::filter_low_quality;
pub use split::split_complex_tasks;

use serde::Serialize;

use crate::models::task::GeneratedTask;

#[derive(Debug, Clone, Serialize)]
pub struct PostProcessConfig {
    pub enable_quality_filter: bool,
    pub enable_dedup: bool,
    /// Cosine similarity at or above which two tasks are duplicates.
    pub similarity_threshold: f32,
    pub enable_split: bool,
    pub enable_merge: bool,
    /// Lower bound of the "related" band; the upper bound is `similarity_threshold`.
    pub merge_threshold: f32,
    pub min_title_chars: usize,
    pub min_confidence: f32,
    pub diacritic_min_title_chars: usize,
    pub diacritic_min_confidence: f32,
}

impl Default for PostProcessConfig {
    fn default() -> Self {
        Self {
            enable_quality_filter: true,
            enable_dedup: true,
            similarity_threshold: 0.85,
            enable_split: true,
            enable_merge: false,
            merge_threshold: 0.70,
            min_title_chars: 10,
            min_confidence: 0.3,
            diacritic_min_title_chars: 5,
            diacritic_min_confidence: 0.2,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PostProcessor {
    config: PostProcessConfig,
}

impl PostProcessor {
    pub fn new(config: PostProcessConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PostProcessConfig {
        &self.config
    }

    pub fn process(&self, tasks: Vec<GeneratedTask>) -> Vec<GeneratedTask> {
        let _span = tracing::info_span!("postprocess", input = tasks.len()).entered();
        let input = tasks.len();
        let mut tasks = tasks;

        if self.config.enable_quality_filter {
            tasks = filter_low_quality(tasks, &self.config);
        }
        if self.config.enable_dedup {
            tasks = deduplicate(tasks, self.config.similarity_threshold);
        }
        if self.config.enable_split {
            tasks = split_complex_tasks(tasks);
        }
        if self.config.enable_merge {
            tasks = merge_related_tasks(tasks, self.config.merge_threshold, self.config.similarity_threshold);
        }
        let tasks = normalize_criteria(tasks);

        tracing::info!(input, output = tasks.len(), "Post-processing complete");
        tasks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::Priority;
    use crate::models::task::TaskSource;

    fn task(title: &str, task_type: &str, priority: Priority, confidence: f32) -> GeneratedTask {
        let source = TaskSource {
            sentence: format!("{title}."),
            section: "Document".into(),
            offset: [0, title.len() + 1],
            line_number: 1,
        };
        let mut t = GeneratedTask::new(title.into(), format!("The system needs to {title}."), source);
        t.task_type = task_type.into();
        t.priority = priority;
        t.confidence = confidence;
        t
    }

    #[test]
    fn full_chain_filters_dedupes_and_splits() {
        let tasks = vec![
            task("Short", "functional", Priority::Medium, 0.9),
            task("Upload receipts from the expense page", "functional", Priority::High, 0.8),
            task("Upload receipts from the expense page", "functional", Priority::High, 0.7),
            task("Encrypt stored receipts at rest", "security", Priority::High, 0.9),
        ];
        let out = PostProcessor::default().process(tasks);
        let titles: Vec<&str> = out.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Backend: Upload receipts from the expense page",
                "Frontend: Upload receipts from the expense page",
                "Testing: Upload receipts from the expense page",
                "Encrypt stored receipts at rest",
            ]
        );
        for t in &out {
            assert!((3..=7).contains(&t.acceptance_criteria.len()));
        }
    }

    #[test]
    fn disabled_stages_are_skipped() {
        let config = PostProcessConfig {
            enable_quality_filter: false,
            enable_dedup: false,
            enable_split: false,
            ..PostProcessConfig::default()
        };
        let tasks = vec![
            task("Short", "functional", Priority::Medium, 0.9),
            task("Upload receipts from the expense page", "functional", Priority::High, 0.8),
            task("Upload receipts from the expense page", "functional", Priority::High, 0.8),
        ];
        let out = PostProcessor::new(config).process(tasks);
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|t| t.acceptance_criteria.len() == 3));
    }

    #[test]
    fn empty_input_stays_empty() {
        assert!(PostProcessor::default().process(Vec::new()).is_empty());
    }
}
