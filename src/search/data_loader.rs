use anyhow::{Context, Result};
use csv::{ByteRecord, ReaderBuilder};
use std::path::Path;

// Expected column headers
const DISH_NAME_COL: &str = "Dish Name";
const INGREDIENTS_COL: &str = "Ingredients";
const INGREDIENTS_LEGACY_COL: &str = "Ingredients (Tagalog)";
const INSTRUCTIONS_COL: &str = "Instructions";
const IMAGE_COL: &str = "Image Name";

/// One row of the recipe dataset. Identified by its row index in [`RecipeStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    pub dish_name: String,
    /// Comma-space separated, original casing.
    pub ingredients: String,
    pub instructions: String,
    pub image_filename: String,
}

/// Immutable, row-ordered recipe table.
#[derive(Debug, Clone, Default)]
pub struct RecipeStore {
    recipes: Vec<Recipe>,
}

impl RecipeStore {
    pub fn new(recipes: Vec<Recipe>) -> Self {
        Self { recipes }
    }

    pub fn get(&self, row: usize) -> Option<&Recipe> {
        self.recipes.get(row)
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Recipe> {
        self.recipes.iter()
    }
}

/// Decodes a CSV field as UTF-8, falling back to Latin-1.
fn decode_field(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

fn column_index(headers: &ByteRecord, names: &[&str]) -> Result<usize> {
    names
        .iter()
        .find_map(|name| {
            headers
                .iter()
                .position(|h| decode_field(h).trim_start_matches('\u{feff}').trim() == *name)
        })
        .ok_or_else(|| anyhow::anyhow!("Column '{}' not found", names[0]))
}

pub fn load_recipe_dataset(csv_path: &Path) -> Result<RecipeStore> {
    if !csv_path.exists() {
        return Err(anyhow::anyhow!("Recipe dataset not found at: {:?}", csv_path));
    }

    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("Failed to open recipe dataset at {:?}", csv_path))?;
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(file);

    let headers = rdr.byte_headers()?.clone();

    let dish_idx = column_index(&headers, &[DISH_NAME_COL])?;
    let ingredients_idx = column_index(&headers, &[INGREDIENTS_COL, INGREDIENTS_LEGACY_COL])?;
    let instructions_idx = column_index(&headers, &[INSTRUCTIONS_COL])?;
    let image_idx = column_index(&headers, &[IMAGE_COL])?;

    let field = |record: &ByteRecord, idx: usize, row: usize| -> Result<String> {
        record
            .get(idx)
            .map(decode_field)
            .ok_or_else(|| anyhow::anyhow!("Missing field {} at row {}", idx, row))
    };

    let mut recipes = Vec::new();
    for (row_index, result) in rdr.byte_records().enumerate() {
        let record = result.with_context(|| format!("Failed to read record at row index {}", row_index))?;

        // Rows are never skipped: the row index is the neighbor index id.
        recipes.push(Recipe {
            dish_name: field(&record, dish_idx, row_index)?,
            ingredients: field(&record, ingredients_idx, row_index)?,
            instructions: field(&record, instructions_idx, row_index)?,
            image_filename: field(&record, image_idx, row_index)?,
        });
    }

    if recipes.is_empty() {
        return Err(anyhow::anyhow!("No recipes loaded from {:?}", csv_path));
    }

    Ok(RecipeStore::new(recipes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_csv_file() -> Result<NamedTempFile> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "{},{},{},{},Category", DISH_NAME_COL, INGREDIENTS_COL, INSTRUCTIONS_COL, IMAGE_COL)?;
        writeln!(file, "Tortang Talong,\"Eggplant, Egg, Salt\",Grill and fry.,tortang_talong.jpg,Main")?;
        writeln!(file, "Sinangag,\"Rice, Garlic, Salt\",Fry the rice.,sinangag.jpg,Side")?;
        writeln!(file, ",\"Egg\",,,")?; // Empty name still keeps its row
        file.flush()?;
        Ok(file)
    }

    #[test]
    fn test_load_recipe_dataset_success() -> Result<()> {
        let file = create_test_csv_file()?;
        let store = load_recipe_dataset(file.path())?;

        assert_eq!(store.len(), 3);

        let first = store.get(0).unwrap();
        assert_eq!(first.dish_name, "Tortang Talong");
        assert_eq!(first.ingredients, "Eggplant, Egg, Salt");
        assert_eq!(first.instructions, "Grill and fry.");
        assert_eq!(first.image_filename, "tortang_talong.jpg");

        let third = store.get(2).unwrap();
        assert_eq!(third.dish_name, "");
        assert_eq!(third.ingredients, "Egg");
        assert!(store.get(3).is_none());

        Ok(())
    }

    #[test]
    fn test_load_recipe_dataset_accepts_legacy_ingredients_column() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "{},{},{},{}", DISH_NAME_COL, INGREDIENTS_LEGACY_COL, INSTRUCTIONS_COL, IMAGE_COL)?;
        writeln!(file, "Adobo,\"Chicken, Soy Sauce, Vinegar\",Simmer.,adobo.jpg")?;
        file.flush()?;

        let store = load_recipe_dataset(file.path())?;
        assert_eq!(store.get(0).unwrap().ingredients, "Chicken, Soy Sauce, Vinegar");
        Ok(())
    }

    #[test]
    fn test_load_recipe_dataset_decodes_latin1_fields() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "{},{},{},{}", DISH_NAME_COL, INGREDIENTS_COL, INSTRUCTIONS_COL, IMAGE_COL)?;
        // "Piñakbet" with ñ as the single Latin-1 byte 0xF1
        file.write_all(b"Pi\xf1akbet,\"Squash, Okra\",Saute.,pinakbet.jpg\n")?;
        file.flush()?;

        let store = load_recipe_dataset(file.path())?;
        assert_eq!(store.get(0).unwrap().dish_name, "Piñakbet");
        Ok(())
    }

    #[test]
    fn test_load_recipe_dataset_missing_column() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "{},{},{}", DISH_NAME_COL, INGREDIENTS_COL, INSTRUCTIONS_COL)?;
        writeln!(file, "Adobo,\"Chicken, Vinegar\",Simmer.")?;
        file.flush()?;

        let result = load_recipe_dataset(file.path());
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains(&format!("Column '{}' not found", IMAGE_COL)));
        Ok(())
    }

    #[test]
    fn test_load_recipe_dataset_empty_file_with_headers() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "{},{},{},{}", DISH_NAME_COL, INGREDIENTS_COL, INSTRUCTIONS_COL, IMAGE_COL)?;
        file.flush()?;

        let result = load_recipe_dataset(file.path());
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("No recipes loaded"));
        Ok(())
    }

    #[test]
    fn test_load_recipe_dataset_file_not_found() {
        let path = Path::new("this_dataset_does_not_exist.csv");
        let result = load_recipe_dataset(path);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Recipe dataset not found"));
    }
}
