pub mod vectorizer;
pub mod linear;
pub mod artifact;
pub mod detector;
pub mod enrich;
pub mod role;
pub mod prefilter;

pub use artifact::TextClassifier;
pub use detector::RequirementDetector;
pub use enrich::{EnrichmentPipeline, EnrichmentResult, LabelEnricher, LabelKind};
pub use role::RoleAssigner;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Model artifact not found: {0}")]
    MissingArtifact(PathBuf),

    #[error("Invalid model artifact {path}: {reason}")]
    InvalidArtifact { path: PathBuf, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Helpers that write small, hand-computed artifacts for tests.
#[cfg(test)]
pub(crate) mod fixtures {
    use std::path::Path;

    /// Binary detector: "must"/"shall" push towards requirement, "meeting"
    /// and "discussed" push away.
    pub fn write_detector(dir: &Path) {
        write(
            dir,
            "requirement_detector",
            serde_json::json!({
                "analyzer": "word",
                "ngram_range": [1, 1],
                "lowercase": true,
                "vocabulary": {"must": 0, "shall": 1, "meeting": 2, "discussed": 3},
                "idf": [1.0, 1.0, 1.0, 1.0]
            }),
            serde_json::json!({
                "classes": [0, 1],
                "coef": [[4.0, 4.0, -4.0, -4.0]],
                "intercept": [-0.5]
            }),
        );
    }

    /// Three-class type model keyed on a single word per class.
    pub fn write_type_model(dir: &Path) {
        write(
            dir,
            "type",
            serde_json::json!({
                "analyzer": "word",
                "ngram_range": [1, 1],
                "lowercase": true,
                "vocabulary": {"screen": 0, "export": 1, "latency": 2},
                "idf": [1.0, 1.0, 1.0]
            }),
            serde_json::json!({
                "classes": ["interface", "data", "performance"],
                "coef": [[3.0, 0.0, 0.0], [0.0, 3.0, 0.0], [0.0, 0.0, 3.0]],
                "intercept": [0.0, 0.0, 0.0]
            }),
        );
    }

    pub fn write(dir: &Path, stem: &str, vectorizer: serde_json::Value, model: serde_json::Value) {
        std::fs::write(
            dir.join(format!("{stem}_vectorizer.json")),
            vectorizer.to_string(),
        )
        .unwrap();
        std::fs::write(dir.join(format!("{stem}_model.json")), model.to_string()).unwrap();
    }
}
