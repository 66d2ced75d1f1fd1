use std::path::PathBuf;

/// Failures of a single recommendation request.
#[derive(thiserror::Error, Debug)]
pub enum RecommendError {
    #[error("invalid request: {0}")]
    Input(String),

    #[error("could not vectorize ingredients: {0}")]
    Vectorization(#[from] VectorizationError),

    #[error("neighbor index returned row {row} but the dataset holds {len} recipes")]
    RecipeNotFound { row: usize, len: usize },

    #[error("unexpected error: {0:?}")]
    Internal(#[from] anyhow::Error),
}

impl RecommendError {
    pub fn is_client_error(&self) -> bool {
        matches!(self, RecommendError::Input(_))
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum VectorizationError {
    #[error("vectorizer produced {actual} features but the neighbor index expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("feature {column} is not a finite number")]
    NonFiniteFeature { column: usize },
}

/// Failures while assembling the service artifacts. Fatal to the process.
#[derive(thiserror::Error, Debug)]
pub enum StartupLoadError {
    #[error("failed to load recipe dataset from {path:?}: {source:#}")]
    Dataset {
        path: PathBuf,
        source: anyhow::Error,
    },

    #[error("failed to load vectorizer from {path:?}: {source:#}")]
    Vectorizer {
        path: PathBuf,
        source: anyhow::Error,
    },

    #[error("failed to load neighbor index from {path:?}: {source:#}")]
    NeighborIndex {
        path: PathBuf,
        source: anyhow::Error,
    },

    #[error("artifacts are inconsistent: {0}")]
    Inconsistent(String),
}
