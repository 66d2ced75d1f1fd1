//! Brute-force k-nearest-neighbor index over recipe ingredient vectors.
#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use base64::{engine::general_purpose, Engine as _};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fs;
use std::path::Path;

use crate::error::VectorizationError;

type Float = f32;

/// k-nearest lookup contract used by the recommendation engine.
pub trait NeighborSearch: Send + Sync {
    /// Dimension of the vectors the index was built over.
    fn dimension(&self) -> usize;

    /// Fixed neighbor count.
    fn k(&self) -> usize;

    /// The `k` nearest rows, ascending by distance.
    fn kneighbors(&self, query: &[Float]) -> Result<Vec<Neighbor>, VectorizationError>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub row: usize,
    pub distance: Float,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[serde(alias = "minkowski", alias = "l2")]
    Euclidean,
    Cosine,
    #[serde(alias = "l1", alias = "cityblock")]
    Manhattan,
}

impl Metric {
    fn distance(self, row: &[Float], query: &[Float]) -> Float {
        match self {
            Metric::Euclidean => row
                .iter()
                .zip(query)
                .map(|(a, b)| (a - b) * (a - b))
                .sum::<Float>()
                .sqrt(),
            Metric::Manhattan => row.iter().zip(query).map(|(a, b)| (a - b).abs()).sum(),
            Metric::Cosine => {
                let dot: Float = row.iter().zip(query).map(|(a, b)| a * b).sum();
                let row_norm = norm(row);
                let query_norm = norm(query);
                if row_norm == 0.0 || query_norm == 0.0 {
                    return 1.0;
                }
                1.0 - dot / (row_norm * query_norm)
            }
        }
    }
}

fn norm(vector: &[Float]) -> Float {
    vector.iter().map(|&x| x * x).sum::<Float>().sqrt()
}

/// On-disk form of the fitted index.
#[derive(Debug, Serialize, Deserialize)]
struct IndexArtifact {
    dimension: usize,
    n_neighbors: usize,
    metric: Metric,
    rows: usize,
    #[serde(with = "base64_floats")]
    matrix: Vec<Float>,
}

mod base64_floats {
    use super::*;
    use bytemuck::cast_slice;
    use serde::{Deserializer, Serializer};

    // Always little-endian, whatever the host byte order.
    pub fn serialize<S: Serializer>(vec: &[Float], serializer: S) -> Result<S::Ok, S::Error> {
        let words: Vec<[u8; 4]> = vec.iter().map(|f| f.to_le_bytes()).collect();
        let bytes: &[u8] = cast_slice(words.as_slice());
        let b64 = general_purpose::STANDARD.encode(bytes);
        serializer.serialize_str(&b64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Float>, D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = general_purpose::STANDARD
            .decode(s)
            .map_err(serde::de::Error::custom)?;
        if bytes.len() % 4 != 0 {
            return Err(serde::de::Error::custom(format!(
                "matrix byte length {} is not a multiple of 4",
                bytes.len()
            )));
        }
        let words: &[[u8; 4]] = cast_slice(bytes.as_slice());
        Ok(words.iter().map(|&word| Float::from_le_bytes(word)).collect())
    }
}

#[derive(PartialEq)]
struct ScoredRow {
    distance: Float,
    row: usize,
}

impl Eq for ScoredRow {}

impl PartialOrd for ScoredRow {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScoredRow {
    // Max-heap on (distance, row): popping drops the farthest candidate, and on
    // equal distance the later row, so ties resolve in row order.
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.row.cmp(&other.row))
    }
}

/// Dense row-major matrix of recipe vectors with a fixed `k` and metric.
#[derive(Debug, Clone)]
pub struct NeighborIndex {
    dimension: usize,
    n_neighbors: usize,
    metric: Metric,
    matrix: Vec<Float>,
}

impl NeighborIndex {
    pub fn from_rows(rows: &[Vec<Float>], n_neighbors: usize, metric: Metric) -> Result<Self> {
        let dimension = rows.first().map(Vec::len).unwrap_or(0);
        let mut matrix = Vec::with_capacity(rows.len() * dimension);
        for (idx, row) in rows.iter().enumerate() {
            if row.len() != dimension {
                anyhow::bail!(
                    "Row {} has dimension {}, expected {}",
                    idx,
                    row.len(),
                    dimension
                );
            }
            matrix.extend_from_slice(row);
        }
        Self::validated(dimension, n_neighbors, metric, rows.len(), matrix)
    }

    fn validated(
        dimension: usize,
        n_neighbors: usize,
        metric: Metric,
        rows: usize,
        matrix: Vec<Float>,
    ) -> Result<Self> {
        if dimension == 0 {
            anyhow::bail!("Index dimension must be positive");
        }
        let expected_len = rows * dimension;
        if matrix.len() != expected_len {
            anyhow::bail!(
                "Matrix size mismatch: expected {}, got {}",
                expected_len,
                matrix.len()
            );
        }
        if n_neighbors == 0 || n_neighbors > rows {
            anyhow::bail!(
                "n_neighbors must be between 1 and the row count {}, got {}",
                rows,
                n_neighbors
            );
        }
        if matrix.iter().any(|v| !v.is_finite()) {
            anyhow::bail!("Index matrix contains NaN or Infinity");
        }
        Ok(Self { dimension, n_neighbors, metric, matrix })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read neighbor index artifact at {:?}", path))?;
        let artifact: IndexArtifact = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse neighbor index artifact at {:?}", path))?;
        Self::validated(
            artifact.dimension,
            artifact.n_neighbors,
            artifact.metric,
            artifact.rows,
            artifact.matrix,
        )
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let artifact = IndexArtifact {
            dimension: self.dimension,
            n_neighbors: self.n_neighbors,
            metric: self.metric,
            rows: self.len(),
            matrix: self.matrix.clone(),
        };
        let serialized = serde_json::to_string(&artifact)?;
        fs::write(path, serialized)
            .with_context(|| format!("Failed to write neighbor index artifact to {:?}", path))?;
        Ok(())
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn len(&self) -> usize {
        self.matrix.len() / self.dimension
    }

    pub fn is_empty(&self) -> bool {
        self.matrix.is_empty()
    }
}

impl NeighborSearch for NeighborIndex {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn k(&self) -> usize {
        self.n_neighbors
    }

    fn kneighbors(&self, query: &[Float]) -> Result<Vec<Neighbor>, VectorizationError> {
        if query.len() != self.dimension {
            return Err(VectorizationError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let metric = self.metric;
        let distances: Vec<Float> = self
            .matrix
            .par_chunks_exact(self.dimension)
            .map(|row| metric.distance(row, query))
            .collect();

        let mut heap = BinaryHeap::with_capacity(self.n_neighbors + 1);
        for (row, distance) in distances.into_iter().enumerate() {
            heap.push(ScoredRow { distance, row });
            if heap.len() > self.n_neighbors {
                heap.pop();
            }
        }

        Ok(heap
            .into_sorted_vec()
            .into_iter()
            .map(|scored| Neighbor { row: scored.row, distance: scored.distance })
            .collect())
    }
}
