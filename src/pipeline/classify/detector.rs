use std::path::Path;

use super::artifact::TextClassifier;

/// Confidence reported for every sentence when no model is loaded.
pub const FALLBACK_CONFIDENCE: f32 = 0.5;

/// Binary "is this sentence a requirement" filter.
///
/// Fails open: without a usable artifact every sentence is a requirement at
/// [`FALLBACK_CONFIDENCE`], so a broken model directory costs precision,
/// never output.
#[derive(Debug, Clone, Default)]
pub struct RequirementDetector {
    model: Option<TextClassifier>,
    positive_index: usize,
}

impl RequirementDetector {
    pub const ARTIFACT_STEM: &'static str = "requirement_detector";

    pub fn load(model_dir: &Path) -> Self {
        match TextClassifier::load(model_dir, Self::ARTIFACT_STEM) {
            Ok(model) => {
                tracing::info!(dir = %model_dir.display(), "Requirement detector loaded");
                Self::from_classifier(model)
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Requirement detector unavailable, every sentence counts as a requirement"
                );
                Self::default()
            }
        }
    }

    pub fn from_classifier(model: TextClassifier) -> Self {
        let positive_index = positive_class_index(model.classes());
        Self {
            model: Some(model),
            positive_index,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    /// `(is_requirement, positive-class probability)` per text. The threshold
    /// is inclusive.
    pub fn detect(&self, texts: &[&str], threshold: f32) -> Vec<(bool, f32)> {
        let Some(model) = &self.model else {
            return vec![(true, FALLBACK_CONFIDENCE); texts.len()];
        };

        texts
            .iter()
            .map(|text| {
                let proba = model.predict_proba(text);
                let positive = proba.get(self.positive_index).copied().unwrap_or(0.0);
                (positive >= threshold, positive)
            })
            .collect()
    }
}

/// Index of the class meaning "requirement": a truthy label if present,
/// otherwise the last class.
fn positive_class_index(classes: &[String]) -> usize {
    classes
        .iter()
        .position(|c| {
            matches!(
                c.trim().to_lowercase().as_str(),
                "1" | "true" | "requirement" | "req" | "yes"
            )
        })
        .unwrap_or(classes.len().saturating_sub(1))
}
