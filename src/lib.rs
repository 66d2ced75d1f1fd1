pub mod cli;
pub mod error;
pub mod ingredients;
pub mod recommender;
pub mod search;
pub mod web;

pub use error::{RecommendError, StartupLoadError, VectorizationError};
pub use recommender::{load_engine, ArtifactPaths, Recommendation, RecommendationEngine};
