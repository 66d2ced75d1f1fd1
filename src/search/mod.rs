pub mod data_loader;
pub mod neighbor_index;
pub mod vectorizer;

pub use data_loader::{load_recipe_dataset, Recipe, RecipeStore};
pub use neighbor_index::{Metric, Neighbor, NeighborIndex, NeighborSearch};
pub use vectorizer::{IngredientVectorizer, Norm, TfidfVectorizer, VectorizerArtifact};
