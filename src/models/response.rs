use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::enums::GenerationMode;
use super::task::GeneratedTask;
use crate::config::{GENERATOR_VERSION, MAX_TASKS_LIMIT};

/// Input to a single pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskGenerationRequest {
    pub text: String,
    pub max_tasks: usize,
    pub requirement_threshold: f32,
    pub epic_name: Option<String>,
    pub domain_hint: Option<String>,
}

impl TaskGenerationRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            max_tasks: crate::config::DEFAULT_MAX_TASKS,
            requirement_threshold: crate::config::DEFAULT_REQUIREMENT_THRESHOLD,
            epic_name: None,
            domain_hint: None,
        }
    }

    pub fn with_max_tasks(mut self, max_tasks: usize) -> Self {
        self.max_tasks = max_tasks;
        self
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.requirement_threshold = threshold;
        self
    }

    pub fn with_epic(mut self, epic: &str) -> Self {
        self.epic_name = Some(epic.to_string());
        self
    }

    pub fn with_domain_hint(mut self, domain: &str) -> Self {
        self.domain_hint = Some(domain.to_string());
        self
    }

    /// max_tasks within 1..=500, threshold within 0..=1.
    pub fn clamped(&self) -> (usize, f32) {
        let max_tasks = self.max_tasks.clamp(1, MAX_TASKS_LIMIT);
        let threshold = if self.requirement_threshold.is_finite() {
            self.requirement_threshold.clamp(0.0, 1.0)
        } else {
            crate::config::DEFAULT_REQUIREMENT_THRESHOLD
        };
        (max_tasks, threshold)
    }
}

/// Distribution counts and aggregates over the final task list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskStats {
    pub type_distribution: BTreeMap<String, usize>,
    pub priority_distribution: BTreeMap<String, usize>,
    pub domain_distribution: BTreeMap<String, usize>,
    pub role_distribution: BTreeMap<String, usize>,
    pub avg_confidence: f32,
    pub total_story_points: u32,
    /// Gaps across all refined tasks.
    pub total_gaps: usize,
    pub needs_clarification: usize,
}

impl TaskStats {
    pub fn from_tasks(tasks: &[GeneratedTask]) -> Self {
        let mut stats = Self::default();
        if tasks.is_empty() {
            return stats;
        }

        for task in tasks {
            *stats.type_distribution.entry(task.task_type.clone()).or_default() += 1;
            *stats
                .priority_distribution
                .entry(task.priority.as_str().to_string())
                .or_default() += 1;
            *stats.domain_distribution.entry(task.domain.clone()).or_default() += 1;
            *stats
                .role_distribution
                .entry(task.role.as_str().to_string())
                .or_default() += 1;
            stats.total_story_points += task.story_points;
            if let Some(report) = task.refinement.as_ref().map(|r| &r.gap_report) {
                stats.total_gaps += report.total_gaps;
                stats.needs_clarification += usize::from(report.requires_clarification);
            }
        }

        let sum: f32 = tasks.iter().map(|t| t.confidence).sum();
        stats.avg_confidence = sum / tasks.len() as f32;
        stats
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskGenerationResponse {
    pub tasks: Vec<GeneratedTask>,
    pub total_tasks: usize,
    pub stats: TaskStats,
    /// Wall-clock seconds spent in the run.
    pub processing_time: f64,
    pub generator_version: String,
    pub mode: GenerationMode,
}

impl TaskGenerationResponse {
    pub fn new(tasks: Vec<GeneratedTask>, mode: GenerationMode, processing_time: f64) -> Self {
        let stats = TaskStats::from_tasks(&tasks);
        Self {
            total_tasks: tasks.len(),
            tasks,
            stats,
            processing_time,
            generator_version: GENERATOR_VERSION.to_string(),
            mode,
        }
    }

    /// Zero-task response for empty input or no detected requirements.
    pub fn empty(mode: GenerationMode, processing_time: f64) -> Self {
        Self::new(Vec::new(), mode, processing_time)
    }
}
