//! Refinement stage: turns each final task's source sentence into a user
//! story with Given/When/Then scenarios and reports what the sentence leaves
//! unsaid.

pub mod gaps;
pub mod story;

use std::collections::HashMap;

pub use gaps::{GapDetector, GapInput};

use crate::models::refinement::Refinement;
use crate::models::task::GeneratedTask;
use crate::pipeline::generation::{EntityExtractor, RuleBasedExtractor};

/// Added to tasks whose gaps should go back to the requirement owner.
pub const CLARIFICATION_LABEL: &str = "needs-clarification";

#[derive(Debug, Clone, Copy)]
pub struct Refiner {
    extractor: RuleBasedExtractor,
    detector: GapDetector,
}

impl Default for Refiner {
    fn default() -> Self {
        Self::new()
    }
}

impl Refiner {
    pub fn new() -> Self {
        Self {
            extractor: RuleBasedExtractor::refined(),
            detector: GapDetector::new(),
        }
    }

    pub fn refine(&self, sentence: &str) -> Refinement {
        let extraction = self.extractor.extract(sentence);
        let scenarios = story::scenarios(sentence, &extraction);
        let non_functional = story::non_functional(sentence);
        let gap_report = self.detector.detect(&GapInput {
            text: sentence,
            extraction: &extraction,
            scenario_count: scenarios.len(),
            non_functional_count: non_functional.len(),
        });
        Refinement {
            user_story: story::user_story(sentence, &extraction),
            scenarios,
            assumptions: story::assumptions(sentence),
            constraints: story::constraints(sentence),
            non_functional,
            gap_report,
        }
    }

    /// Attach a refinement to every task. Tasks sharing a source sentence
    /// (split subtasks, for example) share one refinement.
    pub fn refine_tasks(&self, mut tasks: Vec<GeneratedTask>) -> Vec<GeneratedTask> {
        let _span = tracing::info_span!("refine_tasks", tasks = tasks.len()).entered();
        let mut by_sentence: HashMap<String, Refinement> = HashMap::new();
        let mut gaps = 0usize;
        let mut flagged = 0usize;

        for task in &mut tasks {
            let refinement = by_sentence
                .entry(task.source.sentence.clone())
                .or_insert_with_key(|sentence| self.refine(sentence))
                .clone();
            gaps += refinement.gap_report.total_gaps;
            if refinement.gap_report.requires_clarification {
                tracing::debug!(
                    title = %task.title,
                    critical = refinement.gap_report.critical_count,
                    high = refinement.gap_report.high_count,
                    "Task needs clarification"
                );
                task.add_label(CLARIFICATION_LABEL);
                flagged += 1;
            }
            task.refinement = Some(refinement);
        }

        tracing::info!(refined = tasks.len(), gaps, flagged, "Refinement complete");
        tasks
    }
}
