use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::models::task::GeneratedTask;
use crate::pipeline::classify::vectorizer::char_wb_ngrams;

const MIN_GRAM: usize = 3;
const MAX_GRAM: usize = 5;

/// Raw term-frequency vector over word-bounded character n-grams. Terms are
/// kept sorted so the dot product sums in a fixed order and
/// `a.cosine(b) == b.cosine(a)` holds exactly.
#[derive(Debug, Clone, Default)]
pub struct TermVector {
    counts: BTreeMap<String, f32>,
    norm: f32,
}

impl TermVector {
    pub fn from_text(text: &str) -> Self {
        let mut counts: BTreeMap<String, f32> = BTreeMap::new();
        for gram in char_wb_ngrams(&text.to_lowercase(), MIN_GRAM, MAX_GRAM) {
            *counts.entry(gram).or_insert(0.0) += 1.0;
        }
        let norm = counts.values().map(|c| c * c).sum::<f32>().sqrt();
        Self { counts, norm }
    }

    /// Title and description, the text two tasks are compared on.
    pub fn from_task(task: &GeneratedTask) -> Self {
        Self::from_text(&format!("{} {}", task.title, task.description))
    }

    pub fn cosine(&self, other: &Self) -> f32 {
        if self.norm == 0.0 || other.norm == 0.0 {
            return 0.0;
        }
        let mut left = self.counts.iter().peekable();
        let mut right = other.counts.iter().peekable();
        let mut dot = 0.0f32;
        while let (Some(&(ka, va)), Some(&(kb, vb))) = (left.peek(), right.peek()) {
            match ka.cmp(kb) {
                Ordering::Less => {
                    left.next();
                }
                Ordering::Greater => {
                    right.next();
                }
                Ordering::Equal => {
                    dot += va * vb;
                    left.next();
                    right.next();
                }
            }
        }
        (dot / (self.norm * other.norm)).clamp(0.0, 1.0)
    }
}

pub fn task_similarity(a: &GeneratedTask, b: &GeneratedTask) -> f32 {
    TermVector::from_task(a).cosine(&TermVector::from_task(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_text_is_one() {
        let a = TermVector::from_text("Export audit logs to CSV");
        let b = TermVector::from_text("export   AUDIT logs to csv");
        assert!((a.cosine(&b) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn unrelated_text_is_low() {
        let a = TermVector::from_text("Export audit logs to CSV");
        let b = TermVector::from_text("Render dashboard chart");
        assert!(a.cosine(&b) < 0.2);
    }

    #[test]
    fn empty_text_is_zero() {
        let a = TermVector::from_text("");
        let b = TermVector::from_text("anything");
        assert_eq!(a.cosine(&b), 0.0);
    }

    #[test]
    fn similarity_is_symmetric() {
        let a = TermVector::from_text("Users reset password via email link");
        let b = TermVector::from_text("Reset the password with an email");
        assert_eq!(a.cosine(&b), b.cosine(&a));
        assert!(a.cosine(&b) > 0.3);
    }
}
