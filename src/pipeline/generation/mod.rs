pub mod extract;
pub mod overrides;
pub mod common;
pub mod template;
pub mod model_based;
pub mod prompt;
pub mod parser;
pub mod client;
pub mod external;

pub use client::*;
pub use extract::{EntityExtractor, Extraction, ExtractionCache, RuleBasedExtractor};
pub use external::ExternalServiceGenerator;
pub use model_based::ModelBasedGenerator;
pub use template::TemplateGenerator;

use thiserror::Error;

use crate::models::enums::GenerationMode;
use crate::models::task::GeneratedTask;
use crate::pipeline::classify::EnrichmentResult;
use crate::pipeline::segment::Sentence;
use crate::pipeline_config::PipelineConfig;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Generation service is not reachable at {0}")]
    ServiceConnection(String),

    #[error("Generation service returned error (status {status}): {body}")]
    ServiceError { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Malformed generation output: {0}")]
    MalformedOutput(String),

    #[error("JSON parsing error: {0}")]
    JsonParsing(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Missing credential: {0} is not set")]
    MissingCredential(String),
}

/// One generation strategy. Implementations produce exactly one task per
/// sentence from `generate_one`; batch failures are isolated per sentence.
pub trait TaskGenerator {
    fn mode(&self) -> GenerationMode;

    fn generate_one(
        &self,
        sentence: &Sentence,
        labels: &EnrichmentResult,
        epic: Option<&str>,
        cache: &mut ExtractionCache,
    ) -> Result<GeneratedTask, GenerationError>;

    /// Generate tasks in input order. A sentence without labels gets the
    /// fallback labels; a sentence whose generation fails is logged and
    /// skipped.
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
            let labels = labels.get(index).unwrap_or(&fallback);
            match self.generate_one(sentence, labels, epic, &mut cache) {
                Ok(task) => tasks.push(task),
                Err(e) => tracing::warn!(
                    index,
                    line = sentence.line_number,
                    error = %e,
                    "Task generation failed, skipping sentence"
                ),
            }
        }

        tracing::debug!(
            mode = self.mode().as_str(),
            generated = tasks.len(),
            cached_extractions = cache.len(),
            cache_hits = cache.hits(),
            "Generation batch complete"
        );
        tasks
    }
}

/// Strategy selected once at construction.
pub enum Generator {
    Template(TemplateGenerator),
    ModelBased(ModelBasedGenerator),
    ExternalService(ExternalServiceGenerator),
}

impl Generator {
    /// Build the configured strategy. Only the external service can fail
    /// here (missing credential, HTTP client setup).
    pub fn from_config(config: &PipelineConfig) -> Result<Self, GenerationError> {
        Ok(match config.mode {
            GenerationMode::Template => Self::Template(TemplateGenerator::new()),
            GenerationMode::ModelBased => Self::ModelBased(ModelBasedGenerator::new()),
            GenerationMode::ExternalService => {
                let client = build_client(&config.llm)?;
                Self::ExternalService(ExternalServiceGenerator::new(client, &config.llm))
            }
        })
    }

    fn inner(&self) -> &dyn TaskGenerator {
        match self {
            Self::Template(g) => g,
            Self::ModelBased(g) => g,
            Self::ExternalService(g) => g,
        }
    }
}

impl TaskGenerator for Generator {
    fn mode(&self) -> GenerationMode {
        self.inner().mode()
    }

    fn generate_one(
        &self,
        sentence: &Sentence,
        labels: &EnrichmentResult,
        epic: Option<&str>,
        cache: &mut ExtractionCache,
    ) -> Result<GeneratedTask, GenerationError> {
        self.inner().generate_one(sentence, labels, epic, cache)
    }

    fn generate_batch(
        &self,
        sentences: &[Sentence],
        labels: &[EnrichmentResult],
        epic: Option<&str>,
    ) -> Vec<GeneratedTask> {
        self.inner().generate_batch(sentences, labels, epic)
    }
}
