//! Pipeline configuration read from the process environment.
//!
//! Every knob has a default so an empty environment yields a working
//! model-based pipeline. Malformed numbers and booleans fall back to their
//! defaults with a warning; an unknown generation mode or provider is a
//! configuration error surfaced before any document is processed.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

use crate::config::{self, DEFAULT_MAX_TASKS, DEFAULT_REQUIREMENT_THRESHOLD, MAX_TASKS_LIMIT};
use crate::models::enums::{GenerationMode, LlmProvider};
use crate::pipeline::postprocess::PostProcessConfig;
use crate::pipeline::PipelineError;

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// Settings for the external text-generation service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LlmSettings {
    pub provider: LlmProvider,
    pub model: String,
    /// Overrides the provider's public endpoint (proxies, local Ollama).
    pub base_url: Option<String>,
    #[serde(skip)]
    pub api_key: Option<String>,
    pub temperature: f32,
    /// Extra attempts after the first call.
    pub max_retries: usize,
    pub timeout_secs: u64,
    /// Pause between successive calls.
    pub call_delay_ms: u64,
}

impl LlmSettings {
    pub fn call_delay(&self) -> Duration {
        Duration::from_millis(self.call_delay_ms)
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: LlmProvider::OpenAi,
            model: default_model_for(LlmProvider::OpenAi).to_string(),
            base_url: None,
            api_key: None,
            temperature: 0.3,
            max_retries: 2,
            timeout_secs: 60,
            call_delay_ms: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineConfig {
    pub model_dir: PathBuf,
    pub mode: GenerationMode,
    pub llm: LlmSettings,
    pub requirement_threshold: f32,
    pub max_tasks: usize,
    /// Drop headings, notes and out-of-range lengths before detection.
    pub enable_prefilter: bool,
    pub enable_quality_filter: bool,
    pub enable_dedup: bool,
    pub dedupe_threshold: f32,
    pub enable_split: bool,
    pub enable_merge: bool,
    /// Attach user stories, scenarios and gap reports to final tasks.
    pub enable_refinement: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model_dir: config::models_dir(),
            mode: GenerationMode::ModelBased,
            llm: LlmSettings::default(),
            requirement_threshold: DEFAULT_REQUIREMENT_THRESHOLD,
            max_tasks: DEFAULT_MAX_TASKS,
            enable_prefilter: true,
            enable_quality_filter: true,
            enable_dedup: true,
            dedupe_threshold: 0.85,
            enable_split: true,
            enable_merge: false,
            enable_refinement: true,
        }
    }
}

/// Default model name per provider when `LLM_MODEL` is unset.
pub fn default_model_for(provider: LlmProvider) -> &'static str {
    match provider {
        LlmProvider::OpenAi => "gpt-4o-mini",
        LlmProvider::Anthropic => "claude-3-haiku-20240307",
        LlmProvider::Ollama => "llama3.1",
    }
}

// ═══════════════════════════════════════════════════════════
// Loading
// ═══════════════════════════════════════════════════════════

impl PipelineConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, PipelineError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, PipelineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mode = match get("TASK_GEN_MODE") {
            Some(raw) => {
                GenerationMode::parse(&raw).map_err(|_| PipelineError::UnknownMode(raw))?
            }
            None => defaults.mode,
        };

        let provider = match get("LLM_PROVIDER") {
            Some(raw) => LlmProvider::from_str(raw.trim().to_lowercase().as_str())
                .map_err(|_| PipelineError::UnknownProvider(raw))?,
            None => LlmProvider::OpenAi,
        };

        let api_key = match provider {
            LlmProvider::OpenAi => get("OPENAI_API_KEY"),
            LlmProvider::Anthropic => get("ANTHROPIC_API_KEY").or_else(|| get("OPENAI_API_KEY")),
            LlmProvider::Ollama => None,
        };

        let llm = LlmSettings {
            provider,
            model: get("LLM_MODEL").unwrap_or_else(|| default_model_for(provider).to_string()),
            base_url: get("LLM_BASE_URL"),
            api_key,
            temperature: parse_or(get("LLM_TEMPERATURE"), "LLM_TEMPERATURE", defaults.llm.temperature)
                .clamp(0.0, 1.0),
            max_retries: parse_or(get("LLM_MAX_RETRIES"), "LLM_MAX_RETRIES", defaults.llm.max_retries),
            timeout_secs: parse_or(get("LLM_TIMEOUT_SECS"), "LLM_TIMEOUT_SECS", defaults.llm.timeout_secs),
            call_delay_ms: parse_or(get("LLM_CALL_DELAY_MS"), "LLM_CALL_DELAY_MS", defaults.llm.call_delay_ms),
        };

        Ok(Self {
            model_dir: get("TASK_GEN_MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_dir),
            mode,
            llm,
            requirement_threshold: parse_or(
                get("REQ_THRESHOLD"),
                "REQ_THRESHOLD",
                defaults.requirement_threshold,
            )
            .clamp(0.0, 1.0),
            max_tasks: parse_or(get("MAX_TASKS"), "MAX_TASKS", defaults.max_tasks)
                .clamp(1, MAX_TASKS_LIMIT),
            enable_prefilter: flag_or(get("ENABLE_PREFILTER"), defaults.enable_prefilter),
            enable_quality_filter: flag_or(
                get("ENABLE_QUALITY_FILTER"),
                defaults.enable_quality_filter,
            ),
            enable_dedup: flag_or(get("ENABLE_DEDUP"), defaults.enable_dedup),
            dedupe_threshold: parse_or(
                get("DEDUPE_THRESHOLD"),
                "DEDUPE_THRESHOLD",
                defaults.dedupe_threshold,
            )
            .clamp(0.0, 1.0),
            enable_split: flag_or(get("ENABLE_SPLIT"), defaults.enable_split),
            enable_merge: flag_or(get("ENABLE_MERGE"), defaults.enable_merge),
            enable_refinement: flag_or(get("ENABLE_REFINEMENT"), defaults.enable_refinement),
        })
    }

    /// Post-processing knobs derived from this configuration.
    pub fn postprocess_config(&self) -> PostProcessConfig {
        PostProcessConfig {
            enable_quality_filter: self.enable_quality_filter,
            enable_dedup: self.enable_dedup,
            similarity_threshold: self.dedupe_threshold,
            enable_split: self.enable_split,
            enable_merge: self.enable_merge,
            ..PostProcessConfig::default()
        }
    }

    /// Serializable snapshot of the effective settings (credentials omitted).
    pub fn summary(&self) -> serde_json::Value {
        serde_json::json!({
            "mode": self.mode.as_str(),
            "model_dir": self.model_dir.display().to_string(),
            "llm": {
                "provider": self.llm.provider.as_str(),
                "model": self.llm.model,
                "temperature": self.llm.temperature,
                "max_retries": self.llm.max_retries,
                "api_key_set": self.llm.has_api_key(),
            },
            "requirement_threshold": self.requirement_threshold,
            "max_tasks": self.max_tasks,
            "postprocessing": {
                "prefilter": self.enable_prefilter,
                "quality_filter": self.enable_quality_filter,
                "dedup": self.enable_dedup,
                "dedupe_threshold": self.dedupe_threshold,
                "split": self.enable_split,
                "merge": self.enable_merge,
                "refinement": self.enable_refinement,
            },
        })
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    match raw {
        Some(value) => value.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %value, "Invalid config value, using default");
            default
        }),
        None => default,
    }
}

fn flag_or(raw: Option<String>, default: bool) -> bool {
    match raw.as_deref().map(|v| v.trim().to_lowercase()) {
        Some(v) if matches!(v.as_str(), "true" | "1" | "yes" | "on") => true,
        Some(v) if matches!(v.as_str(), "false" | "0" | "no" | "off") => false,
        _ => default,
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<PipelineConfig, PipelineError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        PipelineConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.mode, GenerationMode::ModelBased);
        assert_eq!(config.max_tasks, 50);
        assert!((config.requirement_threshold - 0.5).abs() < f32::EPSILON);
        assert!(config.enable_dedup);
        assert!(!config.enable_merge);
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.max_retries, 2);
    }

    #[test]
    fn reads_mode_and_provider() {
        let config = config_from(&[
            ("TASK_GEN_MODE", "template"),
            ("LLM_PROVIDER", "Anthropic"),
            ("ANTHROPIC_API_KEY", "sk-test"),
        ])
        .unwrap();
        assert_eq!(config.mode, GenerationMode::Template);
        assert_eq!(config.llm.provider, LlmProvider::Anthropic);
        assert_eq!(config.llm.model, "claude-3-haiku-20240307");
        assert!(config.llm.has_api_key());
    }

    #[test]
    fn unknown_mode_is_fatal() {
        let err = config_from(&[("TASK_GEN_MODE", "quantum")]).unwrap_err();
        assert!(matches!(err, PipelineError::UnknownMode(ref m) if m == "quantum"));
    }

    #[test]
    fn unknown_provider_is_fatal() {
        let err = config_from(&[("LLM_PROVIDER", "azure")]).unwrap_err();
        assert!(matches!(err, PipelineError::UnknownProvider(_)));
    }

    #[test]
    fn malformed_numbers_fall_back() {
        let config = config_from(&[
            ("MAX_TASKS", "lots"),
            ("REQ_THRESHOLD", "7"),
            ("ENABLE_MERGE", "yes"),
            ("ENABLE_SPLIT", "maybe"),
        ])
        .unwrap();
        assert_eq!(config.max_tasks, 50);
        assert!((config.requirement_threshold - 1.0).abs() < f32::EPSILON);
        assert!(config.enable_merge);
        assert!(config.enable_split);
    }

    #[test]
    fn postprocess_config_carries_flags() {
        let config = config_from(&[("DEDUPE_THRESHOLD", "0.9"), ("ENABLE_DEDUP", "false")]).unwrap();
        let post = config.postprocess_config();
        assert!(!post.enable_dedup);
        assert!((post.similarity_threshold - 0.9).abs() < f32::EPSILON);
    }

    #[test]
    fn refinement_flag_is_read() {
        assert!(config_from(&[]).unwrap().enable_refinement);
        let config = config_from(&[("ENABLE_REFINEMENT", "off")]).unwrap();
        assert!(!config.enable_refinement);
        assert_eq!(config.summary()["postprocessing"]["refinement"], false);
    }

    #[test]
    fn summary_hides_api_key() {
        let config = config_from(&[("OPENAI_API_KEY", "sk-secret")]).unwrap();
        let summary = config.summary().to_string();
        assert!(!summary.contains("sk-secret"));
        assert!(summary.contains("\"api_key_set\":true"));
    }
}
