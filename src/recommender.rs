use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::error::{RecommendError, StartupLoadError, VectorizationError};
use crate::ingredients::{IngredientDiff, IngredientSet};
use crate::search::{
    load_recipe_dataset, IngredientVectorizer, NeighborIndex, NeighborSearch, Recipe, RecipeStore,
    TfidfVectorizer,
};

/// One matched recipe with the ingredient differences against the query.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Recommendation {
    #[serde(rename = "Dish Name")]
    pub dish_name: String,
    #[serde(rename = "Ingredients")]
    pub ingredients: String,
    #[serde(rename = "Instructions")]
    pub instructions: String,
    #[serde(rename = "Image Filename")]
    pub image_filename: String,
    #[serde(rename = "Missing Ingredients")]
    pub missing_ingredients: String,
    #[serde(rename = "Unnecessary Ingredients")]
    pub unnecessary_ingredients: String,
}

impl Recommendation {
    fn new(recipe: &Recipe, diff: &IngredientDiff) -> Self {
        Self {
            dish_name: recipe.dish_name.clone(),
            ingredients: recipe.ingredients.clone(),
            instructions: recipe.instructions.clone(),
            image_filename: recipe.image_filename.clone(),
            missing_ingredients: diff.missing.render(),
            unnecessary_ingredients: diff.unnecessary.render(),
        }
    }
}

/// Joins vectorizer, neighbor index and recipe table into recommendations.
///
/// All three collaborators are read-only and shared, so one engine serves
/// any number of concurrent requests.
#[derive(Clone)]
pub struct RecommendationEngine {
    store: Arc<RecipeStore>,
    vectorizer: Arc<dyn IngredientVectorizer>,
    index: Arc<dyn NeighborSearch>,
}

impl RecommendationEngine {
    pub fn new(
        store: Arc<RecipeStore>,
        vectorizer: Arc<dyn IngredientVectorizer>,
        index: Arc<dyn NeighborSearch>,
    ) -> Self {
        Self { store, vectorizer, index }
    }

    /// Number of results every successful call returns.
    pub fn k(&self) -> usize {
        self.index.k()
    }

    pub fn recipe_count(&self) -> usize {
        self.store.len()
    }

    pub fn recommend(&self, ingredients: &str) -> Result<Vec<Recommendation>, RecommendError> {
        let query = ingredients.to_lowercase();
        debug!(query = %query, "recommending dishes");

        let vector = self.vectorizer.transform(&query)?;
        if vector.len() != self.index.dimension() {
            return Err(VectorizationError::DimensionMismatch {
                expected: self.index.dimension(),
                actual: vector.len(),
            }
            .into());
        }
        let neighbors = self.index.kneighbors(&vector)?;

        let query_set = IngredientSet::parse(&query);

        neighbors
            .iter()
            .map(|neighbor| -> Result<Recommendation, RecommendError> {
                let recipe = self.store.get(neighbor.row).ok_or_else(|| {
                    error!(
                        row = neighbor.row,
                        recipes = self.store.len(),
                        "neighbor index points past the recipe dataset; artifacts are out of sync"
                    );
                    RecommendError::RecipeNotFound { row: neighbor.row, len: self.store.len() }
                })?;
                let recipe_set = IngredientSet::parse(&recipe.ingredients);
                let diff = IngredientDiff::between(&recipe_set, &query_set);
                Ok(Recommendation::new(recipe, &diff))
            })
            .collect()
    }
}

/// Locations of the three startup artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub dataset: PathBuf,
    pub vectorizer: PathBuf,
    pub index: PathBuf,
}

fn load_with<T>(
    path: &Path,
    loader: impl FnOnce(&Path) -> anyhow::Result<T>,
    wrap: impl FnOnce(PathBuf, anyhow::Error) -> StartupLoadError,
) -> Result<T, StartupLoadError> {
    loader(path).map_err(|source| wrap(path.to_path_buf(), source))
}

/// Loads and cross-checks the dataset, vectorizer and neighbor index.
pub fn load_engine(paths: &ArtifactPaths) -> Result<RecommendationEngine, StartupLoadError> {
    info!(path = ?paths.dataset, "loading recipe dataset");
    let store = load_with(&paths.dataset, load_recipe_dataset, |path, source| {
        StartupLoadError::Dataset { path, source }
    })?;
    info!(recipes = store.len(), "recipe dataset loaded");

    info!(path = ?paths.vectorizer, "loading vectorizer");
    let vectorizer = load_with(&paths.vectorizer, TfidfVectorizer::load, |path, source| {
        StartupLoadError::Vectorizer { path, source }
    })?;
    info!(features = vectorizer.dimension(), "vectorizer loaded");

    info!(path = ?paths.index, "loading neighbor index");
    let index = load_with(&paths.index, NeighborIndex::load, |path, source| {
        StartupLoadError::NeighborIndex { path, source }
    })?;
    info!(
        rows = index.len(),
        k = index.k(),
        metric = ?index.metric(),
        "neighbor index loaded"
    );

    if vectorizer.dimension() != index.dimension() {
        return Err(StartupLoadError::Inconsistent(format!(
            "vectorizer produces {} features but the neighbor index was built over {}",
            vectorizer.dimension(),
            index.dimension()
        )));
    }
    if index.len() != store.len() {
        warn!(
            index_rows = index.len(),
            recipes = store.len(),
            "neighbor index and recipe dataset row counts differ"
        );
    }

    Ok(RecommendationEngine::new(Arc::new(store), Arc::new(vectorizer), Arc::new(index)))
}
