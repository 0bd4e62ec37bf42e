//! Shared, read-only model state and the caller-owned pipeline cache.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::classify::{EnrichmentPipeline, RequirementDetector};
use super::orchestrator::TaskGenerationPipeline;
use super::PipelineError;
use crate::models::enums::GenerationMode;
use crate::pipeline_config::PipelineConfig;

/// Classifier artifacts loaded once per model directory. Missing or broken
/// artifacts degrade to defaults inside each component, so loading never
/// fails.
#[derive(Debug, Clone, Default)]
pub struct ModelContext {
    pub detector: Arc<RequirementDetector>,
    pub enrichment: Arc<EnrichmentPipeline>,
}

impl ModelContext {
    pub fn load(model_dir: &Path) -> Self {
        let _span = tracing::info_span!("load_models", dir = %model_dir.display()).entered();
        Self {
            detector: Arc::new(RequirementDetector::load(model_dir)),
            enrichment: Arc::new(EnrichmentPipeline::load(model_dir)),
        }
    }
}

/// Every setting a built pipeline depends on. `max_tasks` and
/// `requirement_threshold` are per-request defaults and are left out.
#[derive(Debug, Clone, PartialEq)]
struct CacheKey(PipelineConfig);

impl CacheKey {
    fn of(config: &PipelineConfig) -> Self {
        let defaults = PipelineConfig::default();
        Self(PipelineConfig {
            requirement_threshold: defaults.requirement_threshold,
            max_tasks: defaults.max_tasks,
            ..config.clone()
        })
    }
}

/// Holds the most recently built pipeline and hands it out again while the
/// configuration key is unchanged.
#[derive(Default)]
pub struct PipelineCache {
    entry: Option<(CacheKey, Arc<TaskGenerationPipeline>)>,
    builds: usize,
}

impl PipelineCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_build(&mut self, config: &PipelineConfig) -> Result<Arc<TaskGenerationPipeline>, PipelineError> {
        let key = CacheKey::of(config);
        if let Some((cached_key, pipeline)) = &self.entry {
            if *cached_key == key {
                return Ok(Arc::clone(pipeline));
            }
            tracing::info!(mode = config.mode.as_str(), "Pipeline configuration changed, rebuilding");
        }

        let pipeline = Arc::new(TaskGenerationPipeline::new(config)?);
        self.entry = Some((key, Arc::clone(&pipeline)));
        self.builds += 1;
        Ok(pipeline)
    }

    /// Number of pipelines built so far.
    pub fn builds(&self) -> usize {
        self.builds
    }

    pub fn clear(&mut self) {
        self.entry = None;
    }
}
