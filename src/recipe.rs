use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Difficulty tier of a recipe. Ordered low to high.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[serde(alias = "easy", alias = "Easy", alias = "Bronze")]
    Bronze,
    #[serde(alias = "medium", alias = "Medium", alias = "Silver")]
    Silver,
    #[serde(alias = "hard", alias = "Hard", alias = "Gold")]
    Gold,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Bronze, Difficulty::Silver, Difficulty::Gold];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Bronze => "bronze",
            Difficulty::Silver => "silver",
            Difficulty::Gold => "gold",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Protein/diet classification used by the planner quotas.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Vegan,
    Vegetarian,
    Chicken,
    Fish,
    RedMeat,
}

/// Priority used to pick a recipe's primary category. Vegan before vegetarian
/// so that a vegan dish keeps its stricter classification.
pub const PRIMARY_CATEGORY_ORDER: [Category; 5] = [
    Category::Vegan,
    Category::Vegetarian,
    Category::Chicken,
    Category::Fish,
    Category::RedMeat,
];

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Vegan => "vegan",
            Category::Vegetarian => "vegetarian",
            Category::Chicken => "chicken",
            Category::Fish => "fish",
            Category::RedMeat => "red-meat",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        PRIMARY_CATEGORY_ORDER
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(slug.trim()))
    }

    /// First category in `PRIMARY_CATEGORY_ORDER` present in `slugs`.
    pub fn primary_of<S: AsRef<str>>(slugs: &[S]) -> Option<Self> {
        PRIMARY_CATEGORY_ORDER.into_iter().find(|category| {
            slugs
                .iter()
                .any(|slug| category.as_str().eq_ignore_ascii_case(slug.as_ref().trim()))
        })
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Ingredient {
    #[serde(rename = "_key", default, skip_serializing_if = "String::is_empty")]
    pub key: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub quantity: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    #[serde(rename = "_id", default)]
    pub id: String,
    pub name: String,
    #[serde(with = "slug_field")]
    pub slug: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub summary: String,
    pub difficulty: Difficulty,
    #[serde(default, deserialize_with = "null_as_default")]
    pub categories: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub keywords: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ingredients: Vec<Ingredient>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prep_time: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cook_time: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servings: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pack_slug: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub instructions: serde_json::Value,
}

impl Recipe {
    /// Known categories of this recipe, in declaration order.
    pub fn known_categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.categories.iter().filter_map(|slug| Category::from_slug(slug))
    }

    /// Category membership for matching: a vegan recipe is also vegetarian.
    pub fn in_category(&self, category: Category) -> bool {
        self.known_categories().any(|own| {
            own == category || (category == Category::Vegetarian && own == Category::Vegan)
        })
    }

    pub fn primary_category(&self) -> Option<Category> {
        Category::primary_of(&self.categories)
    }

    /// Keywords plus category slugs, lower-cased and deduplicated.
    pub fn keyword_set(&self) -> Vec<String> {
        let mut set: Vec<String> = Vec::new();
        let mut push = |value: &str| {
            let value = value.trim().to_lowercase();
            if !value.is_empty() && !set.contains(&value) {
                set.push(value);
            }
        };
        for keyword in &self.keywords {
            push(keyword);
        }
        for category in &self.categories {
            push(category);
        }
        if self.in_category(Category::Vegetarian) {
            push(Category::Vegetarian.as_str());
        }
        set
    }

    pub fn has_keyword(&self, keyword: &str) -> bool {
        let wanted = keyword.trim().to_lowercase();
        self.keyword_set().iter().any(|own| *own == wanted)
    }

    pub fn total_time(&self) -> Option<u32> {
        match (self.prep_time, self.cook_time) {
            (None, None) => None,
            (prep, cook) => Some(prep.unwrap_or(0) + cook.unwrap_or(0)),
        }
    }

    /// Case-insensitive substring match over name, summary, keywords and categories.
    pub fn matches_search(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&needle)
            || self.summary.to_lowercase().contains(&needle)
            || self.keywords.iter().any(|k| k.to_lowercase().contains(&needle))
            || self.categories.iter().any(|c| c.to_lowercase().contains(&needle))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RecipePack {
    #[serde(rename = "_id", default)]
    pub id: String,
    pub name: String,
    #[serde(with = "slug_field")]
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub recipes: Vec<Recipe>,
}

impl RecipePack {
    /// Recipes of this pack with `pack_slug` pointing back at the pack.
    pub fn flattened_recipes(&self) -> Vec<Recipe> {
        self.recipes
            .iter()
            .cloned()
            .map(|mut recipe| {
                recipe.pack_slug = Some(self.slug.clone());
                recipe
            })
            .collect()
    }
}

/// CMS projections return `null` for unset fields.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Slugs arrive either as a bare string or as the CMS `{ "current": "..." }` object.
mod slug_field {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawSlug {
        Plain(String),
        Object { current: String },
    }

    #[derive(Serialize)]
    struct SlugObject<'a> {
        current: &'a str,
    }

    pub fn serialize<S: Serializer>(slug: &str, serializer: S) -> Result<S::Ok, S::Error> {
        SlugObject { current: slug }.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(match RawSlug::deserialize(deserializer)? {
            RawSlug::Plain(slug) => slug,
            RawSlug::Object { current } => current,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipe_accepts_cms_shape() {
        let json = r#"{
            "_id": "abc",
            "name": "Lentil Soup",
            "slug": { "current": "lentil-soup" },
            "summary": "Warm and filling",
            "difficulty": "silver",
            "categories": ["vegan"],
            "keywords": ["gluten-free"],
            "ingredients": [{ "_key": "k1", "name": "Lentils", "quantity": "2.4 dl" }],
            "prepTime": 10,
            "cookTime": 30,
            "instructions": [{ "_type": "block" }]
        }"#;
        let recipe: Recipe = serde_json::from_str(json).unwrap();
        assert_eq!(recipe.slug, "lentil-soup");
        assert_eq!(recipe.difficulty, Difficulty::Silver);
        assert_eq!(recipe.total_time(), Some(40));
        assert_eq!(recipe.ingredients[0].quantity, "2.4 dl");
    }

    #[test]
    fn test_legacy_difficulty_labels() {
        let json = r#"{ "name": "Toast", "slug": "toast", "difficulty": "Easy" }"#;
        let recipe: Recipe = serde_json::from_str(json).unwrap();
        assert_eq!(recipe.difficulty, Difficulty::Bronze);
        assert!(recipe.categories.is_empty());
    }

    #[test]
    fn test_vegan_counts_as_vegetarian() {
        let recipe = fixtures::recipe("tofu-bowl", Difficulty::Bronze, &["vegan"]);
        assert!(recipe.in_category(Category::Vegetarian));
        assert!(recipe.in_category(Category::Vegan));
        assert!(!recipe.in_category(Category::Fish));
        assert!(recipe.has_keyword("Vegetarian"));
    }

    #[test]
    fn test_primary_category_follows_priority() {
        let recipe = fixtures::recipe("surf-turf", Difficulty::Gold, &["red-meat", "fish"]);
        assert_eq!(recipe.primary_category(), Some(Category::Fish));
        assert_eq!(Category::primary_of::<&str>(&[]), None);
    }

    #[test]
    fn test_pack_flattening_sets_pack_slug() {
        let pack = RecipePack {
            id: "p".to_string(),
            name: "Autumn".to_string(),
            slug: "autumn".to_string(),
            description: None,
            recipes: vec![fixtures::recipe("stew", Difficulty::Silver, &[])],
        };
        let recipes = pack.flattened_recipes();
        assert_eq!(recipes[0].pack_slug.as_deref(), Some("autumn"));
    }
}
