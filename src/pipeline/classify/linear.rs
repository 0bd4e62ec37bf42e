use serde::{Deserialize, Deserializer, Serialize};

use super::vectorizer::SparseVector;

/// Logistic-regression weights restored from a JSON artifact.
///
/// One coefficient row means a binary model (sigmoid over the positive
/// class, which is `classes[1]`); one row per class means multinomial
/// softmax.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearClassifier {
    #[serde(deserialize_with = "labels_as_strings")]
    pub classes: Vec<String>,
    pub coef: Vec<Vec<f32>>,
    pub intercept: Vec<f32>,
}

impl LinearClassifier {
    pub fn is_binary(&self) -> bool {
        self.coef.len() == 1
    }

    pub fn validate(&self, dimension: usize) -> Result<(), String> {
        if self.classes.len() < 2 {
            return Err(format!("need at least 2 classes, got {}", self.classes.len()));
        }
        let expected_rows = if self.classes.len() == 2 && self.coef.len() == 1 {
            1
        } else {
            self.classes.len()
        };
        if self.coef.len() != expected_rows || self.intercept.len() != expected_rows {
            return Err(format!(
                "expected {expected_rows} coefficient rows and intercepts, got {} and {}",
                self.coef.len(),
                self.intercept.len()
            ));
        }
        if let Some(row) = self.coef.iter().find(|row| row.len() != dimension) {
            return Err(format!(
                "coefficient row width {} does not match vectorizer dimension {dimension}",
                row.len()
            ));
        }
        Ok(())
    }

    /// Class probabilities in `classes` order.
    pub fn predict_proba(&self, x: &SparseVector) -> Vec<f32> {
        let scores: Vec<f32> = self
            .coef
            .iter()
            .zip(&self.intercept)
            .map(|(row, bias)| {
                x.iter()
                    .filter_map(|(i, v)| row.get(*i).map(|w| w * v))
                    .sum::<f32>()
                    + bias
            })
            .collect();

        if self.is_binary() {
            let positive = sigmoid(scores.first().copied().unwrap_or(0.0));
            return vec![1.0 - positive, positive];
        }
        softmax(&scores)
    }

    /// Most probable class; the first class wins exact ties.
    pub fn predict(&self, x: &SparseVector) -> (String, f32) {
        let proba = self.predict_proba(x);
        let mut best = 0;
        for (i, p) in proba.iter().enumerate() {
            if *p > proba[best] {
                best = i;
            }
        }
        let label = self.classes.get(best).cloned().unwrap_or_default();
        (label, proba.get(best).copied().unwrap_or(0.0))
    }
}

fn sigmoid(z: f32) -> f32 {
    1.0 / (1.0 + (-z).exp())
}

fn softmax(scores: &[f32]) -> Vec<f32> {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
    let total: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

/// Class labels may be serialized as numbers (`[0, 1]`) or strings.
fn labels_as_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Vec::<serde_json::Value>::deserialize(deserializer)?;
    Ok(values
        .into_iter()
        .map(|v| match v {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_classes_become_strings() {
        let model: LinearClassifier =
            serde_json::from_str(r#"{"classes":[0,1],"coef":[[1.0]],"intercept":[0.0]}"#).unwrap();
        assert_eq!(model.classes, vec!["0", "1"]);
        assert!(model.is_binary());
    }

    #[test]
    fn binary_probabilities_sum_to_one() {
        let model = LinearClassifier {
            classes: vec!["0".into(), "1".into()],
            coef: vec![vec![2.0, -1.0]],
            intercept: vec![0.0],
        };
        let proba = model.predict_proba(&vec![(0, 1.0)]);
        assert!((proba[0] + proba[1] - 1.0).abs() < 1e-6);
        assert!(proba[1] > 0.85);
    }

    #[test]
    fn empty_vector_uses_intercept_only() {
        let model = LinearClassifier {
            classes: vec!["0".into(), "1".into()],
            coef: vec![vec![2.0]],
            intercept: vec![0.0],
        };
        let proba = model.predict_proba(&Vec::new());
        assert!((proba[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn multiclass_picks_highest_score() {
        let model = LinearClassifier {
            classes: vec!["functional".into(), "security".into(), "data".into()],
            coef: vec![vec![0.0, 0.0], vec![3.0, 0.0], vec![0.0, 1.0]],
            intercept: vec![0.0, 0.0, 0.0],
        };
        let (label, confidence) = model.predict(&vec![(0, 1.0)]);
        assert_eq!(label, "security");
        assert!(confidence > 0.8);
    }

    #[test]
    fn ties_go_to_first_class() {
        let model = LinearClassifier {
            classes: vec!["a".into(), "b".into()],
            coef: vec![vec![0.0], vec![0.0]],
            intercept: vec![0.0, 0.0],
        };
        assert_eq!(model.predict(&Vec::new()).0, "a");
    }

    #[test]
    fn validate_checks_shapes() {
        let model = LinearClassifier {
            classes: vec!["a".into(), "b".into(), "c".into()],
            coef: vec![vec![0.0; 4]; 2],
            intercept: vec![0.0; 2],
        };
        assert!(model.validate(4).is_err());

        let model = LinearClassifier {
            classes: vec!["a".into(), "b".into()],
            coef: vec![vec![0.0; 3]],
            intercept: vec![0.0],
        };
        assert!(model.validate(3).is_ok());
        assert!(model.validate(4).is_err());
    }
}
