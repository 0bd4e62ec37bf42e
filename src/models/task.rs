use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{Complexity, Priority, Role};
use super::refinement::Refinement;
use crate::config::GENERATOR_VERSION;
use crate::pipeline::segment::Sentence;

/// Allowed story point values.
pub const FIBONACCI_POINTS: [u32; 8] = [1, 2, 3, 5, 8, 13, 21, 34];

/// Snap an arbitrary estimate up to the next Fibonacci value, capped at 34.
pub fn snap_story_points(points: u32) -> u32 {
    FIBONACCI_POINTS
        .iter()
        .copied()
        .find(|&p| p >= points.max(1))
        .unwrap_or(34)
}

/// Back-reference to the sentence a task came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSource {
    pub sentence: String,
    pub section: String,
    pub offset: [usize; 2],
    pub line_number: usize,
}

impl From<&Sentence> for TaskSource {
    fn from(sentence: &Sentence) -> Self {
        Self {
            sentence: sentence.text.clone(),
            section: sentence.section.clone(),
            offset: [sentence.start, sentence.end],
            line_number: sentence.line_number,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedTask {
    pub task_id: Uuid,
    pub epic: Option<String>,
    pub module: Option<String>,
    pub title: String,
    pub description: String,
    pub acceptance_criteria: Vec<String>,
    #[serde(rename = "type")]
    pub task_type: String,
    pub priority: Priority,
    pub domain: String,
    pub role: Role,
    pub labels: Vec<String>,
    pub story_points: u32,
    pub complexity: Complexity,
    pub confidence: f32,
    pub source: TaskSource,
    pub dependencies: Vec<Uuid>,
    pub generated_at: DateTime<Utc>,
    pub generator_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refinement: Option<Refinement>,
}

impl GeneratedTask {
    /// A task with defaults for every classification field.
    pub fn new(title: String, description: String, source: TaskSource) -> Self {
        Self {
            task_id: Uuid::new_v4(),
            epic: None,
            module: None,
            title,
            description,
            acceptance_criteria: Vec::new(),
            task_type: "functional".into(),
            priority: Priority::Medium,
            domain: "general".into(),
            role: Role::Backend,
            labels: Vec::new(),
            story_points: 3,
            complexity: Complexity::Medium,
            confidence: 0.5,
            source,
            dependencies: Vec::new(),
            generated_at: Utc::now(),
            generator_version: GENERATOR_VERSION.to_string(),
            refinement: None,
        }
    }

    pub fn set_story_points(&mut self, points: u32) {
        self.story_points = snap_story_points(points);
        self.complexity = Complexity::from_story_points(self.story_points);
    }

    pub fn set_confidence(&mut self, confidence: f32) {
        self.confidence = confidence.clamp(0.0, 1.0);
    }

    pub fn add_label(&mut self, label: &str) {
        let label = label.trim();
        if !label.is_empty() && !self.labels.iter().any(|l| l.eq_ignore_ascii_case(label)) {
            self.labels.push(label.to_string());
        }
    }
}
