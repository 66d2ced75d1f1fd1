use clap::Parser;
use std::path::PathBuf;

use crate::recommender::ArtifactPaths;

/// Serves dish recommendations for a list of ingredients
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the recipe dataset CSV
    #[arg(long, env = "RECOMMENDER_DATASET", default_value = "dish_dataset.csv")]
    pub dataset: PathBuf,

    /// Path to the fitted vectorizer artifact
    #[arg(long, env = "RECOMMENDER_VECTORIZER", default_value = "vectorizer.json")]
    pub vectorizer: PathBuf,

    /// Path to the fitted neighbor index artifact
    #[arg(long, env = "RECOMMENDER_INDEX", default_value = "knn_index.json")]
    pub index: PathBuf,

    /// Address to bind the HTTP listener to
    #[arg(long, env = "RECOMMENDER_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// HTTP port
    #[arg(short, long, env = "RECOMMENDER_PORT", default_value_t = 5001)]
    pub port: u16,

    /// Log filter, e.g. `info` or `dish_recommender=debug`
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

impl Cli {
    pub fn artifact_paths(&self) -> ArtifactPaths {
        ArtifactPaths {
            dataset: self.dataset.clone(),
            vectorizer: self.vectorizer.clone(),
            index: self.index.clone(),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
