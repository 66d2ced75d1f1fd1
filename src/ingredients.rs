use std::collections::BTreeSet;

/// Delimiter used by both the dataset and user queries.
pub const INGREDIENT_DELIMITER: &str = ", ";

/// Rendered in place of an empty ingredient difference.
pub const NONE_MARKER: &str = "None";

/// Lowercased ingredient tokens of one ingredient string.
///
/// Tokens are split on the exact `", "` delimiter and lowercased, nothing
/// else. An empty string is not special-cased: it yields one empty token.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IngredientSet {
    tokens: BTreeSet<String>,
}

impl IngredientSet {
    pub fn parse(raw: &str) -> Self {
        let tokens = raw
            .split(INGREDIENT_DELIMITER)
            .map(|token| token.to_lowercase())
            .collect();
        Self { tokens }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }

    /// Tokens present in `self` but absent from `other`.
    pub fn difference(&self, other: &IngredientSet) -> IngredientSet {
        IngredientSet {
            tokens: self.tokens.difference(&other.tokens).cloned().collect(),
        }
    }

    /// Comma-space joined tokens, or `"None"` when the set is empty.
    pub fn render(&self) -> String {
        if self.tokens.is_empty() {
            return NONE_MARKER.to_string();
        }
        self.iter().collect::<Vec<_>>().join(INGREDIENT_DELIMITER)
    }
}

impl<'a> FromIterator<&'a str> for IngredientSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self {
            tokens: iter.into_iter().map(str::to_lowercase).collect(),
        }
    }
}

/// Missing and unnecessary ingredients of a recipe relative to a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngredientDiff {
    pub missing: IngredientSet,
    pub unnecessary: IngredientSet,
}

impl IngredientDiff {
    pub fn between(recipe: &IngredientSet, query: &IngredientSet) -> Self {
        Self {
            missing: recipe.difference(query),
            unnecessary: query.difference(recipe),
        }
    }

    pub fn is_exact_match(&self) -> bool {
        self.missing.is_empty() && self.unnecessary.is_empty()
    }
}
