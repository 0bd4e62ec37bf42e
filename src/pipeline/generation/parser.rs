use serde::Deserialize;

use super::common::{clamp_title, MAX_CRITERIA};
use super::GenerationError;

const MAX_LABELS: usize = 5;

/// Task fields returned by the generation service. Everything except the
/// title is optional; missing fields default from the sentence's labels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPayload {
    pub title: String,
    pub description: Option<String>,
    pub acceptance_criteria: Vec<String>,
    pub req_type: Option<String>,
    pub priority: Option<String>,
    pub domain: Option<String>,
    pub role: Option<String>,
    pub labels: Vec<String>,
    pub story_points: Option<u32>,
    pub confidence: Option<f32>,
}

/// Criteria arrive either as a list or as one newline-separated string.
#[derive(Deserialize)]
#[serde(untagged)]
enum CriteriaField {
    List(Vec<serde_json::Value>),
    Text(String),
}

#[derive(Deserialize)]
struct RawPayload {
    title: Option<String>,
    description: Option<String>,
    acceptance_criteria: Option<CriteriaField>,
    #[serde(rename = "type")]
    req_type: Option<String>,
    priority: Option<String>,
    domain: Option<String>,
    role: Option<String>,
    labels: Option<Vec<serde_json::Value>>,
    story_points: Option<serde_json::Value>,
    confidence: Option<f32>,
}

/// Parse a service response into a [`TaskPayload`].
pub fn parse_task_response(response: &str) -> Result<TaskPayload, GenerationError> {
    let json_str = extract_json_object(response)?;
    let raw: RawPayload =
        serde_json::from_str(json_str).map_err(|e| GenerationError::JsonParsing(e.to_string()))?;

    let title = raw
        .title
        .map(|t| clamp_title(&t))
        .filter(|t| !t.is_empty())
        .ok_or_else(|| GenerationError::MalformedOutput("Missing task title".into()))?;

    let mut acceptance_criteria: Vec<String> = match raw.acceptance_criteria {
        Some(CriteriaField::List(items)) => items.iter().filter_map(value_text).collect(),
        Some(CriteriaField::Text(text)) => text
            .lines()
            .map(|l| l.trim().trim_start_matches(['-', '*', '•']).trim().to_string())
            .filter(|l| !l.is_empty())
            .collect(),
        None => Vec::new(),
    };
    acceptance_criteria.truncate(MAX_CRITERIA);

    let mut labels: Vec<String> = raw
        .labels
        .unwrap_or_default()
        .iter()
        .filter_map(value_text)
        .collect();
    labels.truncate(MAX_LABELS);

    Ok(TaskPayload {
        title,
        description: non_empty(raw.description),
        acceptance_criteria,
        req_type: non_empty(raw.req_type).map(|t| t.to_lowercase()),
        priority: non_empty(raw.priority),
        domain: non_empty(raw.domain).map(|d| d.to_lowercase()),
        role: non_empty(raw.role),
        labels,
        story_points: raw.story_points.as_ref().and_then(story_points),
        confidence: raw.confidence.filter(|c| c.is_finite()).map(|c| c.clamp(0.0, 1.0)),
    })
}

/// The JSON object inside a ```json fence, or the outermost braces.
fn extract_json_object(response: &str) -> Result<&str, GenerationError> {
    if let Some(start) = response.find("```json") {
        let body = &response[start + 7..];
        let end = body
            .find("```")
            .ok_or_else(|| GenerationError::MalformedOutput("Unclosed JSON block".into()))?;
        return Ok(body[..end].trim());
    }

    let start = response.find('{');
    let end = response.rfind('}');
    match (start, end) {
        (Some(s), Some(e)) if s < e => Ok(&response[s..=e]),
        _ => Err(GenerationError::MalformedOutput("No JSON object found".into())),
    }
}

fn value_text(value: &serde_json::Value) -> Option<String> {
    let text = match value {
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Accepts `5` as well as `"5"`.
fn story_points(value: &serde_json::Value) -> Option<u32> {
    match value {
        serde_json::Value::Number(n) => n.as_u64().map(|v| v.min(u32::MAX as u64) as u32),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
