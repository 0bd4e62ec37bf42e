use std::path::Path;

use serde::de::DeserializeOwned;

use super::linear::LinearClassifier;
use super::vectorizer::TfidfVectorizer;
use super::ModelError;

/// A vectorizer + classifier pair loaded from `{stem}_vectorizer.json` and
/// `{stem}_model.json`. An optional `{stem}_classes.json` overrides the
/// class list stored in the model file.
#[derive(Debug, Clone)]
pub struct TextClassifier {
    vectorizer: TfidfVectorizer,
    classifier: LinearClassifier,
}

impl TextClassifier {
    pub fn load(model_dir: &Path, stem: &str) -> Result<Self, ModelError> {
        let vectorizer_path = model_dir.join(format!("{stem}_vectorizer.json"));
        let model_path = model_dir.join(format!("{stem}_model.json"));
        let classes_path = model_dir.join(format!("{stem}_classes.json"));

        let vectorizer: TfidfVectorizer = read_json(&vectorizer_path)?;
        let mut classifier: LinearClassifier = read_json(&model_path)?;

        if classes_path.exists() {
            let classes: Vec<String> = read_json(&classes_path)?;
            if classes.len() != classifier.classes.len() {
                return Err(ModelError::InvalidArtifact {
                    path: classes_path,
                    reason: format!(
                        "{} classes listed but model has {}",
                        classes.len(),
                        classifier.classes.len()
                    ),
                });
            }
            classifier.classes = classes;
        }

        vectorizer
            .validate()
            .map_err(|reason| ModelError::InvalidArtifact {
                path: vectorizer_path,
                reason,
            })?;
        classifier
            .validate(vectorizer.dimension())
            .map_err(|reason| ModelError::InvalidArtifact {
                path: model_path,
                reason,
            })?;

        tracing::debug!(
            stem,
            features = vectorizer.dimension(),
            classes = classifier.classes.len(),
            "Loaded classifier artifact"
        );
        Ok(Self {
            vectorizer,
            classifier,
        })
    }

    pub fn classes(&self) -> &[String] {
        &self.classifier.classes
    }

    pub fn predict_proba(&self, text: &str) -> Vec<f32> {
        self.classifier
            .predict_proba(&self.vectorizer.transform(text))
    }

    pub fn predict(&self, text: &str) -> (String, f32) {
        self.classifier.predict(&self.vectorizer.transform(text))
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ModelError> {
    if !path.exists() {
        return Err(ModelError::MissingArtifact(path.to_path_buf()));
    }
    let raw = std::fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|e| ModelError::InvalidArtifact {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::classify::fixtures;

    #[test]
    fn loads_valid_artifact_pair() {
        let dir = tempfile::tempdir().unwrap();
        fixtures::write_type_model(dir.path());
        let model = TextClassifier::load(dir.path(), "type").unwrap();
        assert_eq!(model.classes(), ["interface", "data", "performance"]);
        assert_eq!(model.predict("Export the report").0, "data");
    }

    #[test]
    fn missing_files_report_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = TextClassifier::load(dir.path(), "domain").unwrap_err();
        match err {
            ModelError::MissingArtifact(path) => {
                assert!(path.ends_with("domain_vectorizer.json"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn malformed_json_is_invalid_artifact() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("type_vectorizer.json"), "not json").unwrap();
        std::fs::write(dir.path().join("type_model.json"), "{}").unwrap();
        let err = TextClassifier::load(dir.path(), "type").unwrap_err();
        assert!(matches!(err, ModelError::InvalidArtifact { .. }));
    }

    #[test]
    fn classes_file_overrides_labels() {
        let dir = tempfile::tempdir().unwrap();
        fixtures::write_type_model(dir.path());
        std::fs::write(
            dir.path().join("type_classes.json"),
            r#"["ui", "data", "perf"]"#,
        )
        .unwrap();
        let model = TextClassifier::load(dir.path(), "type").unwrap();
        assert_eq!(model.predict("screen layout").0, "ui");
    }

    #[test]
    fn mismatched_dimensions_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fixtures::write(
            dir.path(),
            "priority",
            serde_json::json!({"vocabulary": {"must": 0, "may": 1}, "idf": [1.0, 1.0]}),
            serde_json::json!({"classes": ["Low", "High"], "coef": [[1.0]], "intercept": [0.0]}),
        );
        let err = TextClassifier::load(dir.path(), "priority").unwrap_err();
        assert!(matches!(err, ModelError::InvalidArtifact { .. }));
    }
}
