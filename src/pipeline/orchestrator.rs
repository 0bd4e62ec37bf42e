use std::time::Instant;

use super::classify::{prefilter, EnrichmentResult};
use super::context::ModelContext;
use super::generation::{Generator, TaskGenerator};
use super::postprocess::PostProcessor;
use super::refine::Refiner;
use super::segment::{Segmenter, Sentence};
use super::PipelineError;
use crate::config::DEFAULT_REQUIREMENT_THRESHOLD;
use crate::models::enums::GenerationMode;
use crate::models::response::{TaskGenerationRequest, TaskGenerationResponse};
use crate::models::task::GeneratedTask;
use crate::pipeline_config::PipelineConfig;

/// Runs a document through the full chain:
/// segment → pre-filter → detect → top-N → enrich → generate → post-process
/// → refine.
///
/// Document content never makes a run fail; the worst outcome is an empty
/// response.
pub struct TaskGenerationPipeline {
    segmenter: Segmenter,
    models: ModelContext,
    generator: Generator,
    postprocessor: PostProcessor,
    refiner: Option<Refiner>,
    enable_prefilter: bool,
}

impl TaskGenerationPipeline {
    /// Load models and build the configured generator. Fails only on
    /// generator setup (for example a missing API key).
    pub fn new(config: &PipelineConfig) -> Result<Self, PipelineError> {
        let _span = tracing::info_span!("build_pipeline", mode = config.mode.as_str()).entered();
        let generator = Generator::from_config(config)?;
        let models = ModelContext::load(&config.model_dir);
        tracing::info!(
            mode = config.mode.as_str(),
            detector_loaded = models.detector.is_loaded(),
            "Task generation pipeline ready"
        );
        Ok(Self::with_components(models, generator, PostProcessor::new(config.postprocess_config()))
            .with_prefilter(config.enable_prefilter)
            .with_refinement(config.enable_refinement))
    }

    pub fn with_components(models: ModelContext, generator: Generator, postprocessor: PostProcessor) -> Self {
        Self {
            segmenter: Segmenter::default(),
            models,
            generator,
            postprocessor,
            refiner: Some(Refiner::new()),
            enable_prefilter: true,
        }
    }

    pub fn with_prefilter(mut self, enabled: bool) -> Self {
        self.enable_prefilter = enabled;
        self
    }

    pub fn with_refinement(mut self, enabled: bool) -> Self {
        self.refiner = enabled.then(Refiner::new);
        self
    }

    pub fn mode(&self) -> GenerationMode {
        self.generator.mode()
    }

    pub fn generate_tasks(&self, request: &TaskGenerationRequest) -> TaskGenerationResponse {
        let start = Instant::now();
        let (max_tasks, threshold) = request.clamped();
        let _span = tracing::info_span!(
            "generate_tasks",
            mode = self.mode().as_str(),
            chars = request.text.chars().count(),
            max_tasks,
        )
        .entered();

        if request.text.trim().is_empty() {
            tracing::info!("Empty document, no tasks generated");
            return TaskGenerationResponse::empty(self.mode(), start.elapsed().as_secs_f64());
        }

        let (sections, sentences) = self.segmenter.segment(&request.text);
        tracing::debug!(sections = sections.len(), sentences = sentences.len(), "Segmentation complete");

        let candidates: Vec<Sentence> = if self.enable_prefilter {
            let kept: Vec<Sentence> = sentences
                .into_iter()
                .filter(|s| prefilter::is_valid_candidate(&s.text))
                .collect();
            tracing::debug!(candidates = kept.len(), "Pre-filter applied");
            kept
        } else {
            sentences
        };

        let (selected, detection) = self.detect_top(candidates, threshold, max_tasks);
        if selected.is_empty() {
            tracing::info!("No requirement sentences detected");
            return TaskGenerationResponse::empty(self.mode(), start.elapsed().as_secs_f64());
        }

        let tasks = self.generate_for(
            &selected,
            &detection,
            request.epic_name.as_deref(),
            request.domain_hint.as_deref(),
        );

        let response = TaskGenerationResponse::new(tasks, self.mode(), start.elapsed().as_secs_f64());
        tracing::info!(
            tasks = response.total_tasks,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Task generation complete"
        );
        response
    }

    /// Tasks for sentences that were segmented elsewhere. Detection runs at
    /// the default threshold; no pre-filter and no top-N cut.
    pub fn generate_from_sentences(&self, sentences: &[Sentence], epic: Option<&str>) -> Vec<GeneratedTask> {
        let _span = tracing::info_span!("generate_from_sentences", sentences = sentences.len()).entered();
        let (selected, detection) =
            self.detect_top(sentences.to_vec(), DEFAULT_REQUIREMENT_THRESHOLD, sentences.len());
        if selected.is_empty() {
            return Vec::new();
        }
        self.generate_for(&selected, &detection, epic, None)
    }

    /// Requirement sentences with their detection confidence, limited to the
    /// `limit` most confident and returned in document order.
    fn detect_top(&self, candidates: Vec<Sentence>, threshold: f32, limit: usize) -> (Vec<Sentence>, Vec<f32>) {
        let texts: Vec<&str> = candidates.iter().map(|s| s.text.as_str()).collect();
        let results = self.models.detector.detect(&texts, threshold);

        let mut hits: Vec<(usize, f32)> = results
            .into_iter()
            .enumerate()
            .filter(|(_, (is_requirement, _))| *is_requirement)
            .map(|(index, (_, confidence))| (index, confidence))
            .collect();
        tracing::debug!(candidates = candidates.len(), requirements = hits.len(), threshold, "Detection complete");

        if hits.len() > limit {
            hits.sort_by(|a, b| b.1.total_cmp(&a.1));
            hits.truncate(limit);
            hits.sort_by_key(|(index, _)| *index);
            tracing::info!(kept = limit, "Requirement sentences truncated to top-N");
        }

        let detection = hits.iter().map(|(_, confidence)| *confidence).collect();
        let mut slots: Vec<Option<Sentence>> = candidates.into_iter().map(Some).collect();
        let selected = hits.iter().filter_map(|(index, _)| slots[*index].take()).collect();
        (selected, detection)
    }

    fn generate_for(
        &self,
        sentences: &[Sentence],
        detection: &[f32],
        epic: Option<&str>,
        domain_hint: Option<&str>,
    ) -> Vec<GeneratedTask> {
        let texts: Vec<&str> = sentences.iter().map(|s| s.text.as_str()).collect();
        let labels: Vec<EnrichmentResult> = self
            .models
            .enrichment
            .enrich(&texts)
            .into_iter()
            .zip(detection)
            .map(|(labels, &confidence)| {
                let labels = labels.with_detection_confidence(confidence);
                match domain_hint.map(str::trim).filter(|d| !d.is_empty()) {
                    Some(domain) => labels.with_domain(domain),
                    None => labels,
                }
            })
            .collect();

        let generated = self.generator.generate_batch(sentences, &labels, epic);
        tracing::debug!(generated = generated.len(), "Generation stage complete");
        let tasks = self.postprocessor.process(generated);
        match &self.refiner {
            Some(refiner) => refiner.refine_tasks(tasks),
            None => tasks,
        }
    }
}
