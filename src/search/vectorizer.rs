use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::error::VectorizationError;

/// Maps ingredient text into the feature space the neighbor index was built in.
pub trait IngredientVectorizer: Send + Sync {
    /// Number of features produced by [`transform`](Self::transform).
    fn dimension(&self) -> usize;

    fn transform(&self, text: &str) -> Result<Vec<f32>, VectorizationError>;
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    L1,
    L2,
}

fn default_norm() -> Option<Norm> {
    Some(Norm::L2)
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

/// On-disk form of a fitted vectorizer.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct VectorizerArtifact {
    pub vocabulary: HashMap<String, usize>,
    #[serde(default)]
    pub idf: Option<Vec<f32>>,
    #[serde(default = "default_ngram_range")]
    pub ngram_range: (usize, usize),
    #[serde(default = "default_norm")]
    pub norm: Option<Norm>,
    #[serde(default)]
    pub sublinear_tf: bool,
}

/// Pre-fitted bag-of-words / tf-idf transform.
///
/// Tokens are runs of two or more word characters of the lowercased text,
/// combined into word n-grams. Terms outside the vocabulary are dropped, so
/// text with no known term maps to the zero vector.
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Option<Vec<f32>>,
    ngram_range: (usize, usize),
    norm: Option<Norm>,
    sublinear_tf: bool,
    dimension: usize,
}

impl TfidfVectorizer {
    pub fn from_artifact(artifact: VectorizerArtifact) -> Result<Self> {
        let VectorizerArtifact { vocabulary, idf, ngram_range, norm, sublinear_tf } = artifact;

        if vocabulary.is_empty() {
            anyhow::bail!("Vocabulary is empty");
        }
        let dimension = vocabulary.len();

        let mut seen = HashSet::with_capacity(dimension);
        for (term, &column) in &vocabulary {
            if column >= dimension {
                anyhow::bail!("Term '{}' maps to column {} outside dimension {}", term, column, dimension);
            }
            if !seen.insert(column) {
                anyhow::bail!("Column {} is assigned to more than one term", column);
            }
        }

        if let Some(weights) = &idf {
            if weights.len() != dimension {
                anyhow::bail!("Idf length mismatch: expected {}, got {}", dimension, weights.len());
            }
            if weights.iter().any(|w| !w.is_finite()) {
                anyhow::bail!("Idf weights contain NaN or Infinity");
            }
        }

        let (min_n, max_n) = ngram_range;
        if min_n == 0 || min_n > max_n {
            anyhow::bail!("Invalid ngram range ({}, {})", min_n, max_n);
        }

        Ok(Self { vocabulary, idf, ngram_range, norm, sublinear_tf, dimension })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read vectorizer artifact at {:?}", path))?;
        let artifact: VectorizerArtifact = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse vectorizer artifact at {:?}", path))?;
        Self::from_artifact(artifact)
    }

    fn terms(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = lowered
            .split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .filter(|token| token.chars().count() >= 2)
            .collect();

        let (min_n, max_n) = self.ngram_range;
        let mut terms = Vec::new();
        for n in min_n..=max_n {
            if n > tokens.len() {
                break;
            }
            terms.extend(tokens.windows(n).map(|window| window.join(" ")));
        }
        terms
    }
}

impl IngredientVectorizer for TfidfVectorizer {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn transform(&self, text: &str) -> Result<Vec<f32>, VectorizationError> {
        let mut vector = vec![0.0f32; self.dimension];
        for term in self.terms(text) {
            if let Some(&column) = self.vocabulary.get(&term) {
                vector[column] += 1.0;
            }
        }

        if self.sublinear_tf {
            for value in vector.iter_mut().filter(|v| **v > 0.0) {
                *value = 1.0 + value.ln();
            }
        }
        if let Some(idf) = &self.idf {
            for (value, weight) in vector.iter_mut().zip(idf) {
                *value *= weight;
            }
        }

        let norm = match self.norm {
            Some(Norm::L2) => vector.iter().map(|v| v * v).sum::<f32>().sqrt(),
            Some(Norm::L1) => vector.iter().map(|v| v.abs()).sum::<f32>(),
            None => 1.0,
        };
        if norm > 0.0 && norm != 1.0 {
            for value in vector.iter_mut() {
                *value /= norm;
            }
        }

        if let Some(column) = vector.iter().position(|v| !v.is_finite()) {
            return Err(VectorizationError::NonFiniteFeature { column });
        }
        Ok(vector)
    }
}
