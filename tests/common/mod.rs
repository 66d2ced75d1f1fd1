#![allow(dead_code)]

use anyhow::Result;
use dish_recommender::search::{
    IngredientVectorizer, Metric, NeighborIndex, TfidfVectorizer, VectorizerArtifact,
};
use dish_recommender::{load_engine, ArtifactPaths, RecommendationEngine};
use std::fs;
use tempfile::TempDir;

pub const TERMS: &[&str] = &[
    "egg", "salt", "onion", "pepper", "rice", "garlic", "chicken", "vinegar", "soy", "sauce",
    "eggplant", "tomato",
];

pub const RECIPES: &[(&str, &str)] = &[
    ("Scrambled Eggs", "Egg, Salt"),
    ("Omelette", "Egg, Salt, Onion, Pepper"),
    ("Sinangag", "Rice, Garlic, Salt"),
    ("Boiled Egg", "Egg"),
    ("Chicken Adobo", "Chicken, Vinegar, Soy Sauce, Garlic, Pepper"),
    ("Tortang Talong", "Eggplant, Egg, Salt, Onion"),
    ("Ginisang Kamatis", "Tomato, Egg, Onion, Garlic"),
];

pub const K: usize = 3;

pub fn vectorizer_artifact() -> VectorizerArtifact {
    VectorizerArtifact {
        vocabulary: TERMS.iter().enumerate().map(|(i, t)| (t.to_string(), i)).collect(),
        idf: None,
        ngram_range: (1, 1),
        norm: None,
        sublinear_tf: false,
    }
}

/// Writes dataset, vectorizer and index artifacts into a fresh directory.
pub fn write_artifacts() -> Result<(TempDir, ArtifactPaths)> {
    let dir = tempfile::tempdir()?;
    let paths = ArtifactPaths {
        dataset: dir.path().join("dish_dataset.csv"),
        vectorizer: dir.path().join("vectorizer.json"),
        index: dir.path().join("knn_index.json"),
    };

    let mut writer = csv::Writer::from_path(&paths.dataset)?;
    writer.write_record(["Dish Name", "Ingredients", "Instructions", "Image Name"])?;
    for (name, ingredients) in RECIPES {
        let image = format!("{}.jpg", name.to_lowercase().replace(' ', "_"));
        writer.write_record([*name, *ingredients, "Cook everything together.", image.as_str()])?;
    }
    writer.flush()?;

    let artifact = vectorizer_artifact();
    fs::write(&paths.vectorizer, serde_json::to_string(&artifact)?)?;

    let vectorizer = TfidfVectorizer::from_artifact(artifact)?;
    let rows = RECIPES
        .iter()
        .map(|(_, ingredients)| vectorizer.transform(&ingredients.to_lowercase()))
        .collect::<Result<Vec<_>, _>>()?;
    NeighborIndex::from_rows(&rows, K, Metric::Euclidean)?.save(&paths.index)?;

    Ok((dir, paths))
}

pub fn fixture_engine() -> Result<(TempDir, RecommendationEngine)> {
    let (dir, paths) = write_artifacts()?;
    let engine = load_engine(&paths)?;
    Ok((dir, engine))
}
