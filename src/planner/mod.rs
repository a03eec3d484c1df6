pub mod availability;
pub mod generator;
pub mod random;
pub mod reroll;

pub use availability::{count_available, Availability};
pub use generator::generate;
pub use random::{InOrder, RandomSource, RngSource};
pub use reroll::reroll;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

use crate::catalog::{CatalogError, RecipeCatalog};
use crate::recipe::{Category, Difficulty, Recipe};

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Could not generate a full meal plan ({filled} of {requested} meals found). Try loosening your criteria.")]
    Unsatisfiable { filled: usize, requested: usize },
    #[error("No alternative recipes found matching the criteria for '{slug}'.")]
    NoAlternative { slug: String },
    #[error("Recipe catalog unavailable: {0}")]
    Catalog(#[from] CatalogError),
}

/// Required counts per key plus an "any" overflow bucket.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(bound(
    serialize = "K: Ord + Serialize",
    deserialize = "K: Ord + Deserialize<'de>"
))]
pub struct QuotaMap<K: Ord> {
    #[serde(default)]
    pub specific: BTreeMap<K, u32>,
    #[serde(default)]
    pub any: u32,
}

impl<K: Ord> Default for QuotaMap<K> {
    fn default() -> Self {
        Self { specific: BTreeMap::new(), any: 0 }
    }
}

impl<K: Ord + Copy> QuotaMap<K> {
    pub fn with(mut self, key: K, count: u32) -> Self {
        self.set(key, count);
        self
    }

    pub fn set(&mut self, key: K, count: u32) {
        if count == 0 {
            self.specific.remove(&key);
        } else {
            self.specific.insert(key, count);
        }
    }

    pub fn need(&self, key: K) -> u32 {
        self.specific.get(&key).copied().unwrap_or(0)
    }

    pub fn specific_total(&self) -> u32 {
        self.specific.values().fold(0, |sum, count| sum.saturating_add(*count))
    }

    pub fn total(&self) -> u32 {
        self.specific_total().saturating_add(self.any)
    }

    /// Sets the "any" bucket to whatever `total` leaves after the specific quotas.
    pub fn fill_any(&mut self, total: u32) {
        self.any = total.saturating_sub(self.specific_total());
    }

    /// Decrements the specific need for `key`, saturating at zero.
    /// Returns false when there was no open need.
    pub fn take(&mut self, key: K) -> bool {
        match self.specific.get_mut(&key) {
            Some(count) if *count > 0 => {
                *count -= 1;
                true
            }
            _ => false,
        }
    }

    pub fn take_any(&mut self) -> bool {
        if self.any > 0 {
            self.any -= 1;
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct PlannerCriteria {
    /// Pack slugs to draw from. Empty means every pack.
    #[serde(default)]
    pub packs: Vec<String>,
    /// Keywords every recipe must carry.
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub difficulty: QuotaMap<Difficulty>,
    #[serde(default)]
    pub categories: QuotaMap<Category>,
}

impl PlannerCriteria {
    /// Recomputes both "any" buckets as `max(0, total - sum(specific))`.
    pub fn with_meal_count(mut self, total: u32) -> Self {
        self.difficulty.fill_any(total);
        self.categories.fill_any(total);
        self
    }

    pub fn total_meals(&self) -> u32 {
        match self.categories.total() {
            0 => self.difficulty.total(),
            total => total,
        }
    }

    pub fn includes_pack(&self, recipe: &Recipe) -> bool {
        self.packs.is_empty()
            || recipe
                .pack_slug
                .as_ref()
                .is_some_and(|pack| self.packs.iter().any(|selected| selected == pack))
    }

    pub fn matches_keywords(&self, recipe: &Recipe) -> bool {
        self.keywords.iter().all(|keyword| recipe.has_keyword(keyword))
    }

    pub fn accepts(&self, recipe: &Recipe) -> bool {
        self.includes_pack(recipe) && self.matches_keywords(recipe)
    }
}

/// Catalog recipes passing the pack and keyword filters, in catalog order.
pub fn eligible_pool<'a>(criteria: &PlannerCriteria, catalog: &'a [Recipe]) -> Vec<&'a Recipe> {
    catalog.iter().filter(|recipe| criteria.accepts(recipe)).collect()
}

/// An ordered list of distinct recipes (the "hand" before it is scheduled).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(transparent)]
pub struct MealPlan {
    recipes: Vec<Recipe>,
}

impl MealPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.recipes.iter().any(|recipe| recipe.slug == slug)
    }

    pub fn slugs(&self) -> Vec<String> {
        self.recipes.iter().map(|recipe| recipe.slug.clone()).collect()
    }

    pub fn used_slugs(&self) -> HashSet<String> {
        self.recipes.iter().map(|recipe| recipe.slug.clone()).collect()
    }

    pub fn get(&self, slug: &str) -> Option<&Recipe> {
        self.recipes.iter().find(|recipe| recipe.slug == slug)
    }

    /// Appends a recipe unless its slug is already present.
    pub fn add(&mut self, recipe: Recipe) -> bool {
        if self.contains(&recipe.slug) {
            return false;
        }
        self.recipes.push(recipe);
        true
    }

    /// Appends every recipe of `other` not already in the plan.
    pub fn extend(&mut self, other: MealPlan) -> usize {
        let mut added = 0;
        for recipe in other.recipes {
            if self.add(recipe) {
                added += 1;
            }
        }
        added
    }

    /// Replaces the recipe with `slug`, keeping its position.
    pub fn replace(&mut self, slug: &str, replacement: Recipe) -> Option<Recipe> {
        if replacement.slug != slug && self.contains(&replacement.slug) {
            return None;
        }
        let position = self.recipes.iter().position(|recipe| recipe.slug == slug)?;
        Some(std::mem::replace(&mut self.recipes[position], replacement))
    }

    pub fn remove(&mut self, slug: &str) -> Option<Recipe> {
        let position = self.recipes.iter().position(|recipe| recipe.slug == slug)?;
        Some(self.recipes.remove(position))
    }

    pub fn clear(&mut self) {
        self.recipes.clear();
    }

    /// Plan entries per difficulty tier.
    pub fn count_by_difficulty(&self) -> BTreeMap<Difficulty, usize> {
        let mut counts = BTreeMap::new();
        for recipe in &self.recipes {
            *counts.entry(recipe.difficulty).or_insert(0) += 1;
        }
        counts
    }

    /// Plan entries per primary category; recipes without one are not counted.
    pub fn count_by_category(&self) -> BTreeMap<Category, usize> {
        let mut counts = BTreeMap::new();
        for category in self.recipes.iter().filter_map(Recipe::primary_category) {
            *counts.entry(category).or_insert(0) += 1;
        }
        counts
    }
}

impl From<Vec<Recipe>> for MealPlan {
    fn from(recipes: Vec<Recipe>) -> Self {
        let mut plan = MealPlan::new();
        for recipe in recipes {
            plan.add(recipe);
        }
        plan
    }
}

/// Runs the planning engines against a catalog, fetching it once per call.
pub struct MealPlanner<C: RecipeCatalog> {
    catalog: C,
}

impl<C: RecipeCatalog> MealPlanner<C> {
    pub fn new(catalog: C) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub async fn generate(
        &self,
        criteria: &PlannerCriteria,
        already_used: &HashSet<String>,
        random: &mut (dyn RandomSource + Send),
    ) -> Result<MealPlan, PlanError> {
        let recipes = self.catalog.all_recipes().await?;
        generate(criteria, &recipes, already_used, random)
    }

    pub async fn reroll(
        &self,
        criteria: &PlannerCriteria,
        plan: &MealPlan,
        slug_to_replace: &str,
        random: &mut (dyn RandomSource + Send),
    ) -> Result<Recipe, PlanError> {
        let replaced = plan
            .get(slug_to_replace)
            .ok_or_else(|| PlanError::NoAlternative { slug: slug_to_replace.to_string() })?;
        let recipes = self.catalog.all_recipes().await?;
        reroll(
            criteria,
            &recipes,
            &plan.slugs(),
            slug_to_replace,
            &replaced.categories,
            replaced.difficulty,
            random,
        )
    }

    pub async fn counts(&self, criteria: &PlannerCriteria) -> Result<Availability, PlanError> {
        let recipes = self.catalog.all_recipes().await?;
        Ok(count_available(criteria, &recipes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::fixtures::recipe;

    #[test]
    fn test_any_bucket_absorbs_remainder() {
        let criteria = PlannerCriteria {
            categories: QuotaMap::default().with(Category::Vegan, 2).with(Category::Fish, 1),
            difficulty: QuotaMap::default().with(Difficulty::Gold, 5),
            ..Default::default()
        }
        .with_meal_count(4);

        assert_eq!(criteria.categories.any, 1);
        assert_eq!(criteria.difficulty.any, 0);
        assert_eq!(criteria.total_meals(), 4);
    }

    #[test]
    fn test_quota_take_saturates() {
        let mut quota = QuotaMap::default().with(Difficulty::Bronze, 1);
        assert!(quota.take(Difficulty::Bronze));
        assert!(!quota.take(Difficulty::Bronze));
        assert!(!quota.take(Difficulty::Gold));
        assert!(!quota.take_any());
        assert_eq!(quota.need(Difficulty::Bronze), 0);
    }

    #[test]
    fn test_quota_totals_saturate() {
        let mut quota = QuotaMap::default().with(Category::Vegan, u32::MAX).with(Category::Fish, 1);
        quota.any = 5;
        assert_eq!(quota.specific_total(), u32::MAX);
        assert_eq!(quota.total(), u32::MAX);

        let criteria = PlannerCriteria { categories: quota, ..Default::default() };
        assert_eq!(criteria.total_meals(), u32::MAX);
    }

    #[test]
    fn test_keyword_filter_is_and() {
        let mut tagged = recipe("salad", Difficulty::Bronze, &["vegan"]);
        tagged.keywords = vec!["gluten-free".to_string(), "quick".to_string()];
        let criteria = PlannerCriteria {
            keywords: vec!["gluten-free".to_string(), "vegetarian".to_string()],
            ..Default::default()
        };
        assert!(criteria.accepts(&tagged));

        let criteria = PlannerCriteria {
            keywords: vec!["gluten-free".to_string(), "spicy".to_string()],
            ..Default::default()
        };
        assert!(!criteria.accepts(&tagged));
    }

    #[test]
    fn test_pack_filter() {
        let criteria = PlannerCriteria { packs: vec!["autumn".to_string()], ..Default::default() };
        let mut stew = recipe("stew", Difficulty::Silver, &[]);
        assert!(!criteria.accepts(&stew));
        stew.pack_slug = Some("autumn".to_string());
        assert!(criteria.accepts(&stew));
    }

    #[test]
    fn test_plan_replace_keeps_position() {
        let mut plan = MealPlan::from(vec![
            recipe("a", Difficulty::Bronze, &[]),
            recipe("b", Difficulty::Bronze, &[]),
            recipe("c", Difficulty::Bronze, &[]),
        ]);
        let old = plan.replace("b", recipe("d", Difficulty::Bronze, &[]));
        assert_eq!(old.map(|r| r.slug), Some("b".to_string()));
        assert_eq!(plan.slugs(), vec!["a", "d", "c"]);

        // replacing with a recipe already in the plan is refused
        assert!(plan.replace("a", recipe("c", Difficulty::Bronze, &[])).is_none());
    }

    #[test]
    fn test_plan_extend_skips_duplicates() {
        let mut plan = MealPlan::from(vec![recipe("a", Difficulty::Bronze, &[])]);
        let added = plan.extend(MealPlan::from(vec![
            recipe("a", Difficulty::Bronze, &[]),
            recipe("b", Difficulty::Gold, &[]),
        ]));
        assert_eq!(added, 1);
        assert_eq!(plan.slugs(), vec!["a", "b"]);
        assert_eq!(plan.count_by_difficulty().get(&Difficulty::Bronze), Some(&1));
        assert_eq!(plan.count_by_difficulty().get(&Difficulty::Gold), Some(&1));
    }
}
