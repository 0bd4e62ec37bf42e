use std::path::Path;

use serde::Serialize;

use super::artifact::TextClassifier;
use super::role::RoleAssigner;
use crate::models::enums::{Priority, Role};

/// Confidence attached to a default label.
pub const DEFAULT_LABEL_CONFIDENCE: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    Type,
    Priority,
    Domain,
}

impl LabelKind {
    pub fn artifact_stem(&self) -> &'static str {
        match self {
            Self::Type => "type",
            Self::Priority => "priority",
            Self::Domain => "domain",
        }
    }

    pub fn default_label(&self) -> &'static str {
        match self {
            Self::Type => "functional",
            Self::Priority => "Medium",
            Self::Domain => "general",
        }
    }
}

/// One label dimension backed by its own artifact pair.
#[derive(Debug, Clone)]
pub struct LabelEnricher {
    kind: LabelKind,
    model: Option<TextClassifier>,
}

impl LabelEnricher {
    /// Load this enricher's artifacts; a failure only affects this label.
    pub fn load(model_dir: &Path, kind: LabelKind) -> Self {
        match TextClassifier::load(model_dir, kind.artifact_stem()) {
            Ok(model) => Self {
                kind,
                model: Some(model),
            },
            Err(e) => {
                tracing::warn!(
                    label = kind.artifact_stem(),
                    default = kind.default_label(),
                    error = %e,
                    "Label enricher unavailable, using default label"
                );
                Self::unloaded(kind)
            }
        }
    }

    pub fn unloaded(kind: LabelKind) -> Self {
        Self { kind, model: None }
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub fn predict(&self, text: &str) -> (String, f32) {
        match &self.model {
            Some(model) => {
                let (label, confidence) = model.predict(text);
                if label.trim().is_empty() {
                    (self.kind.default_label().to_string(), DEFAULT_LABEL_CONFIDENCE)
                } else {
                    (label, confidence)
                }
            }
            None => (self.kind.default_label().to_string(), DEFAULT_LABEL_CONFIDENCE),
        }
    }
}

/// Per-sentence labels. Never mutated: derive a new value instead.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichmentResult {
    #[serde(rename = "type")]
    pub req_type: String,
    pub priority: Priority,
    pub domain: String,
    pub role: Role,
    pub confidence: f32,
    pub type_confidence: f32,
    pub priority_confidence: f32,
    pub domain_confidence: f32,
}

impl EnrichmentResult {
    /// Labels used when nothing else is known about a sentence.
    pub fn fallback() -> Self {
        Self {
            req_type: LabelKind::Type.default_label().to_string(),
            priority: Priority::Medium,
            domain: LabelKind::Domain.default_label().to_string(),
            role: Role::Backend,
            confidence: DEFAULT_LABEL_CONFIDENCE,
            type_confidence: DEFAULT_LABEL_CONFIDENCE,
            priority_confidence: DEFAULT_LABEL_CONFIDENCE,
            domain_confidence: DEFAULT_LABEL_CONFIDENCE,
        }
    }

    /// Same labels with the detector's confidence folded into the minimum.
    pub fn with_detection_confidence(&self, detection: f32) -> Self {
        Self {
            confidence: self.confidence.min(detection),
            ..self.clone()
        }
    }

    pub fn with_domain(&self, domain: &str) -> Self {
        Self {
            domain: domain.trim().to_lowercase(),
            ..self.clone()
        }
    }
}

/// Type, priority and domain enrichers plus the rule-based role assigner.
#[derive(Debug, Clone)]
pub struct EnrichmentPipeline {
    type_enricher: LabelEnricher,
    priority_enricher: LabelEnricher,
    domain_enricher: LabelEnricher,
    roles: RoleAssigner,
}

impl Default for EnrichmentPipeline {
    fn default() -> Self {
        Self {
            type_enricher: LabelEnricher::unloaded(LabelKind::Type),
            priority_enricher: LabelEnricher::unloaded(LabelKind::Priority),
            domain_enricher: LabelEnricher::unloaded(LabelKind::Domain),
            roles: RoleAssigner::new(),
        }
    }
}

impl EnrichmentPipeline {
    pub fn load(model_dir: &Path) -> Self {
        let pipeline = Self {
            type_enricher: LabelEnricher::load(model_dir, LabelKind::Type),
            priority_enricher: LabelEnricher::load(model_dir, LabelKind::Priority),
            domain_enricher: LabelEnricher::load(model_dir, LabelKind::Domain),
            roles: RoleAssigner::new(),
        };
        tracing::info!(
            type_model = pipeline.type_enricher.is_loaded(),
            priority_model = pipeline.priority_enricher.is_loaded(),
            domain_model = pipeline.domain_enricher.is_loaded(),
            "Enrichment pipeline ready"
        );
        pipeline
    }

    pub fn enrich(&self, texts: &[&str]) -> Vec<EnrichmentResult> {
        texts.iter().map(|text| self.enrich_one(text)).collect()
    }

    fn enrich_one(&self, text: &str) -> EnrichmentResult {
        let (req_type, type_confidence) = self.type_enricher.predict(text);
        let (priority, priority_confidence) = self.priority_enricher.predict(text);
        let (domain, domain_confidence) = self.domain_enricher.predict(text);

        let req_type = req_type.trim().to_lowercase();
        let role = self.roles.assign(text, &req_type);

        EnrichmentResult {
            role,
            req_type,
            priority: Priority::parse_lenient(&priority),
            domain: domain.trim().to_lowercase(),
            confidence: type_confidence.min(priority_confidence).min(domain_confidence),
            type_confidence,
            priority_confidence,
            domain_confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::classify::fixtures;

    #[test]
    fn missing_models_give_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = EnrichmentPipeline::load(dir.path());
        let results = pipeline.enrich(&["The dashboard page must display totals."]);
        let r = &results[0];
        assert_eq!(r.req_type, "functional");
        assert_eq!(r.priority, Priority::Medium);
        assert_eq!(r.domain, "general");
        assert_eq!(r.role, Role::Frontend);
        assert_eq!(r.confidence, 0.5);
    }

    #[test]
    fn enrichers_fail_independently() {
        let dir = tempfile::tempdir().unwrap();
        fixtures::write_type_model(dir.path());
        let pipeline = EnrichmentPipeline::load(dir.path());
        let r = &pipeline.enrich(&["Users must export invoices."])[0];
        assert_eq!(r.req_type, "data");
        assert!(r.type_confidence > 0.5);
        assert_eq!(r.priority, Priority::Medium);
        assert_eq!(r.priority_confidence, 0.5);
        assert_eq!(r.domain, "general");
    }

    #[test]
    fn overall_confidence_is_minimum() {
        let dir = tempfile::tempdir().unwrap();
        fixtures::write_type_model(dir.path());
        let pipeline = EnrichmentPipeline::load(dir.path());
        let r = &pipeline.enrich(&["Users must export invoices."])[0];
        let expected = r
            .type_confidence
            .min(r.priority_confidence)
            .min(r.domain_confidence);
        assert_eq!(r.confidence, expected);
    }

    #[test]
    fn type_label_feeds_role_hint() {
        let dir = tempfile::tempdir().unwrap();
        fixtures::write_type_model(dir.path());
        let pipeline = EnrichmentPipeline::load(dir.path());
        let r = &pipeline.enrich(&["Keep latency low."])[0];
        assert_eq!(r.req_type, "performance");
        assert_eq!(r.role, Role::DevOps);
    }

    #[test]
    fn derived_results_do_not_touch_original() {
        let base = EnrichmentResult::fallback();
        let folded = base.with_detection_confidence(0.2).with_domain("Healthcare");
        assert_eq!(base.confidence, 0.5);
        assert_eq!(folded.confidence, 0.2);
        assert_eq!(folded.domain, "healthcare");
        assert_eq!(base.with_detection_confidence(0.9).confidence, 0.5);
    }
}
