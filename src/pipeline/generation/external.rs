//! Strategy backed by an external text-generation service.
//!
//! Every sentence yields exactly one task: the service is asked up to
//! `max_retries + 1` times, and when it stays unreachable or keeps returning
//! malformed output the sentence gets a minimal fallback task instead.

use std::time::Duration;

use crate::models::enums::{GenerationMode, Priority, Role};
use crate::models::task::GeneratedTask;
use crate::pipeline::classify::EnrichmentResult;
use crate::pipeline::segment::Sentence;
use crate::pipeline_config::LlmSettings;

use super::client::LlmClient;
use super::common::{assemble_task, TaskDraft};
use super::extract::ExtractionCache;
use super::parser::{parse_task_response, TaskPayload};
use super::prompt::{build_task_prompt, TASK_SYSTEM_PROMPT};
use super::{GenerationError, TaskGenerator};

/// Confidence of a task built without the service.
pub const FALLBACK_CONFIDENCE: f32 = 0.5;
pub const FALLBACK_LABEL: &str = "fallback";
const FALLBACK_TITLE_WORDS: usize = 10;
const FALLBACK_TITLE_CHARS: usize = 80;

pub struct ExternalServiceGenerator {
    client: Box<dyn LlmClient + Send + Sync>,
    model: String,
    max_retries: usize,
    call_delay: Duration,
}

impl ExternalServiceGenerator {
    pub fn new(client: Box<dyn LlmClient + Send + Sync>, settings: &LlmSettings) -> Self {
        Self {
            client,
            model: settings.model.clone(),
            max_retries: settings.max_retries,
            call_delay: settings.call_delay(),
        }
    }

    /// Call the service and parse its answer, retrying transport failures
    /// and malformed output.
    fn call_with_retry(&self, prompt: &str, line: usize) -> Result<TaskPayload, GenerationError> {
        let mut last_error: Option<GenerationError> = None;

        for attempt in 0..=self.max_retries {
            let response = match self.client.generate(&self.model, prompt, TASK_SYSTEM_PROMPT) {
                Ok(resp) => resp,
                Err(e) if is_retryable_error(&e) && attempt < self.max_retries => {
                    tracing::warn!(line, attempt = attempt + 1, error = %e, "Generation call failed, retrying");
                    last_error = Some(e);
                    continue;
                }
                Err(e) => return Err(e),
            };

            match parse_task_response(&response) {
                Ok(payload) => return Ok(payload),
                Err(e) if is_parse_error(&e) && attempt < self.max_retries => {
                    tracing::warn!(line, attempt = attempt + 1, error = %e, "Generation output malformed, retrying");
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error
            .unwrap_or_else(|| GenerationError::MalformedOutput("All retry attempts exhausted".into())))
    }

    fn task_from_payload(
        payload: TaskPayload,
        sentence: &Sentence,
        labels: &EnrichmentResult,
        epic: Option<&str>,
    ) -> GeneratedTask {
        let merged = EnrichmentResult {
            req_type: payload.req_type.clone().unwrap_or_else(|| labels.req_type.clone()),
            priority: payload
                .priority
                .as_deref()
                .map(Priority::parse_lenient)
                .unwrap_or(labels.priority),
            domain: payload.domain.clone().unwrap_or_else(|| labels.domain.clone()),
            role: payload.role.as_deref().map(Role::parse_lenient).unwrap_or(labels.role),
            confidence: labels.confidence.min(payload.confidence.unwrap_or(1.0)),
            ..labels.clone()
        };

        let draft = TaskDraft {
            title: payload.title,
            description: payload.description.unwrap_or_default(),
            acceptance_criteria: payload.acceptance_criteria,
        };
        let mut task = assemble_task(draft, sentence, &merged, epic, false);
        if let Some(points) = payload.story_points {
            task.set_story_points(points);
        }
        for label in &payload.labels {
            task.add_label(label);
        }
        task
    }

    /// Minimal task from the sentence's leading words.
    pub fn fallback_task(
        sentence: &Sentence,
        labels: &EnrichmentResult,
        epic: Option<&str>,
    ) -> GeneratedTask {
        let lead = sentence
            .text
            .split_whitespace()
            .take(FALLBACK_TITLE_WORDS)
            .collect::<Vec<_>>()
            .join(" ");
        let title: String = format!("Implement: {lead}")
            .chars()
            .take(FALLBACK_TITLE_CHARS)
            .collect();

        let draft = TaskDraft {
            title: title.trim_end().to_string(),
            description: format!("Requirement: {}", sentence.text.trim()),
            acceptance_criteria: vec![
                "The requirement is implemented as described".into(),
                "The implementation is covered by automated tests".into(),
                "The change is reviewed and documented".into(),
            ],
        };
        let mut task = assemble_task(draft, sentence, labels, epic, false);
        task.set_confidence(FALLBACK_CONFIDENCE);
        task.add_label(FALLBACK_LABEL);
        task
    }
}

impl TaskGenerator for ExternalServiceGenerator {
    fn mode(&self) -> GenerationMode {
        GenerationMode::ExternalService
    }

    fn generate_one(
        &self,
        sentence: &Sentence,
        labels: &EnrichmentResult,
        epic: Option<&str>,
        _cache: &mut ExtractionCache,
    ) -> Result<GeneratedTask, GenerationError> {
        let prompt = build_task_prompt(&sentence.text, labels, epic);
        match self.call_with_retry(&prompt, sentence.line_number) {
            Ok(payload) => Ok(Self::task_from_payload(payload, sentence, labels, epic)),
            Err(e) => {
                tracing::warn!(
                    line = sentence.line_number,
                    error = %e,
                    "Generation service exhausted, using fallback task"
                );
                Ok(Self::fallback_task(sentence, labels, epic))
            }
        }
    }

    fn generate_batch(
        &self,
        sentences: &[Sentence],
        labels: &[EnrichmentResult],
        epic: Option<&str>,
    ) -> Vec<GeneratedTask> {
        let mut cache = ExtractionCache::new();
        let fallback = EnrichmentResult::fallback();
        let mut tasks = Vec::with_capacity(sentences.len());

        for (index, sentence) in sentences.iter().enumerate() {
            if index > 0 && !self.call_delay.is_zero() {
                std::thread::sleep(self.call_delay);
            }
            let labels = labels.get(index).unwrap_or(&fallback);
            match self.generate_one(sentence, labels, epic, &mut cache) {
                Ok(task) => tasks.push(task),
                Err(e) => {
                    tracing::warn!(index, error = %e, "Unexpected generation failure, using fallback task");
                    tasks.push(Self::fallback_task(sentence, labels, epic));
                }
            }
        }
        tasks
    }
}

/// Transport failures, rate limiting and server-side errors. Client errors
/// (bad request, bad credential) fail the same way on every attempt.
fn is_retryable_error(e: &GenerationError) -> bool {
    match e {
        GenerationError::ServiceConnection(_) | GenerationError::HttpClient(_) => true,
        GenerationError::ServiceError { status, .. } => *status == 429 || *status >= 500,
        _ => false,
    }
}

/// Output that could not be read as a task (worth a fresh call).
fn is_parse_error(e: &GenerationError) -> bool {
    matches!(
        e,
        GenerationError::MalformedOutput(_)
            | GenerationError::JsonParsing(_)
            | GenerationError::ResponseParsing(_)
    )
}
