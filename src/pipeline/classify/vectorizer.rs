use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Word tokens of two or more word characters.
static WORD_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w\w+\b").unwrap());

/// Sorted (feature index, weight) pairs.
pub type SparseVector = Vec<(usize, f32)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Analyzer {
    #[default]
    Word,
    /// Character n-grams inside word boundaries, words padded with a space.
    CharWb,
}

/// TF-IDF feature extractor restored from a JSON artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    #[serde(default)]
    pub analyzer: Analyzer,
    #[serde(default = "default_ngram_range")]
    pub ngram_range: (usize, usize),
    #[serde(default = "default_lowercase")]
    pub lowercase: bool,
    #[serde(default)]
    pub sublinear_tf: bool,
    pub vocabulary: HashMap<String, usize>,
    pub idf: Vec<f32>,
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

fn default_lowercase() -> bool {
    true
}

impl TfidfVectorizer {
    /// Number of features the vectorizer emits.
    pub fn dimension(&self) -> usize {
        self.idf.len()
    }

    /// Structural checks run once at load time.
    pub fn validate(&self) -> Result<(), String> {
        let (min_n, max_n) = self.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(format!("invalid ngram_range ({min_n}, {max_n})"));
        }
        if self.vocabulary.is_empty() {
            return Err("empty vocabulary".into());
        }
        if let Some(max_index) = self.vocabulary.values().max() {
            if *max_index >= self.idf.len() {
                return Err(format!(
                    "vocabulary index {max_index} exceeds idf length {}",
                    self.idf.len()
                ));
            }
        }
        Ok(())
    }

    /// L2-normalized TF-IDF vector for one document.
    pub fn transform(&self, text: &str) -> SparseVector {
        let text = if self.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };
        let (min_n, max_n) = self.ngram_range;
        let terms = match self.analyzer {
            Analyzer::Word => word_ngrams(&text, min_n, max_n),
            Analyzer::CharWb => char_wb_ngrams(&text, min_n, max_n),
        };

        let mut counts: BTreeMap<usize, f32> = BTreeMap::new();
        for term in &terms {
            if let Some(&index) = self.vocabulary.get(term) {
                *counts.entry(index).or_default() += 1.0;
            }
        }

        let mut vector: SparseVector = counts
            .into_iter()
            .map(|(index, tf)| {
                let tf = if self.sublinear_tf { 1.0 + tf.ln() } else { tf };
                let idf = self.idf.get(index).copied().unwrap_or(1.0);
                (index, tf * idf)
            })
            .collect();

        let norm = vector.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
        if norm > 0.0 {
            for (_, w) in &mut vector {
                *w /= norm;
            }
        }
        vector
    }
}

/// Word n-grams joined by single spaces.
pub fn word_ngrams(text: &str, min_n: usize, max_n: usize) -> Vec<String> {
    let tokens: Vec<&str> = WORD_TOKEN.find_iter(text).map(|m| m.as_str()).collect();
    let mut grams = Vec::new();
    for n in min_n.max(1)..=max_n {
        if n > tokens.len() {
            break;
        }
        for window in tokens.windows(n) {
            grams.push(window.join(" "));
        }
    }
    grams
}

/// Character n-grams taken per whitespace-separated word, each word padded
/// with one space on both sides. A word shorter than `n` contributes its
/// padded form once.
pub fn char_wb_ngrams(text: &str, min_n: usize, max_n: usize) -> Vec<String> {
    let mut grams = Vec::new();
    for word in text.split_whitespace() {
        let padded: Vec<char> = std::iter::once(' ')
            .chain(word.chars())
            .chain(std::iter::once(' '))
            .collect();
        for n in min_n.max(1)..=max_n {
            if padded.len() <= n {
                grams.push(padded.iter().collect());
                break;
            }
            for window in padded.windows(n) {
                grams.push(window.iter().collect());
            }
        }
    }
    grams
}
