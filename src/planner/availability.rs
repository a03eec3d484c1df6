use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::PlannerCriteria;
use crate::recipe::{Category, Difficulty, Recipe, PRIMARY_CATEGORY_ORDER};

/// Recipe counts used to size quotas before generating a plan.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    pub categories: BTreeMap<Category, usize>,
    pub difficulties: BTreeMap<Difficulty, usize>,
    pub keyword_counts: BTreeMap<String, usize>,
    pub total_available: usize,
}

impl Availability {
    pub fn category(&self, category: Category) -> usize {
        self.categories.get(&category).copied().unwrap_or(0)
    }

    pub fn difficulty(&self, difficulty: Difficulty) -> usize {
        self.difficulties.get(&difficulty).copied().unwrap_or(0)
    }

    /// Caps a requested meal count at the number of matching recipes.
    pub fn clamp_meal_count(&self, requested: u32) -> u32 {
        requested.min(self.total_available as u32)
    }

    /// Caps a category quota at what the pool offers for it.
    pub fn clamp_category(&self, category: Category, requested: u32) -> u32 {
        requested.min(self.category(category).min(self.total_available) as u32)
    }

    pub fn clamp_difficulty(&self, difficulty: Difficulty, requested: u32) -> u32 {
        requested.min(self.difficulty(difficulty).min(self.total_available) as u32)
    }

    /// Lowers the meal count and every specific quota to what the pool can supply,
    /// then refills both "any" buckets.
    pub fn clamp_criteria(&self, criteria: &PlannerCriteria) -> PlannerCriteria {
        let mut clamped = criteria.clone();
        for (category, count) in clamped.categories.specific.iter_mut() {
            *count = self.clamp_category(*category, *count);
        }
        clamped.categories.specific.retain(|_, count| *count > 0);
        for (difficulty, count) in clamped.difficulty.specific.iter_mut() {
            *count = self.clamp_difficulty(*difficulty, *count);
        }
        clamped.difficulty.specific.retain(|_, count| *count > 0);

        let meals = self.clamp_meal_count(criteria.total_meals());
        clamped.with_meal_count(meals)
    }
}

/// Counts recipes per category, difficulty and keyword in the packs selected by
/// `criteria`. `total_available` additionally applies the keyword filter.
pub fn count_available(criteria: &PlannerCriteria, catalog: &[Recipe]) -> Availability {
    let mut availability = Availability::default();
    for category in PRIMARY_CATEGORY_ORDER {
        availability.categories.insert(category, 0);
    }
    for difficulty in Difficulty::ALL {
        availability.difficulties.insert(difficulty, 0);
    }

    let pack_pool = catalog.iter().filter(|recipe| criteria.includes_pack(recipe));
    for recipe in pack_pool {
        for category in PRIMARY_CATEGORY_ORDER {
            if recipe.in_category(category) {
                *availability.categories.entry(category).or_insert(0) += 1;
            }
        }
        *availability.difficulties.entry(recipe.difficulty).or_insert(0) += 1;
        for keyword in recipe.keyword_set() {
            *availability.keyword_counts.entry(keyword).or_insert(0) += 1;
        }
        if criteria.matches_keywords(recipe) {
            availability.total_available += 1;
        }
    }

    availability
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::QuotaMap;
    use crate::recipe::fixtures::recipe;

    fn catalog() -> Vec<Recipe> {
        let mut chana = recipe("chana-masala", Difficulty::Bronze, &["vegan"]);
        chana.keywords = vec!["gluten-free".to_string()];
        let mut salmon = recipe("salmon-bake", Difficulty::Silver, &["fish"]);
        salmon.keywords = vec!["gluten-free".to_string(), "quick".to_string()];
        let mut stew = recipe("beef-stew", Difficulty::Gold, &["red-meat"]);
        stew.pack_slug = Some("winter".to_string());
        vec![
            chana,
            recipe("omelette", Difficulty::Bronze, &["vegetarian"]),
            salmon,
            stew,
        ]
    }

    #[test]
    fn test_counts_all_packs() {
        let availability = count_available(&PlannerCriteria::default(), &catalog());
        assert_eq!(availability.category(Category::Vegan), 1);
        assert_eq!(availability.category(Category::Vegetarian), 2);
        assert_eq!(availability.category(Category::Chicken), 0);
        assert_eq!(availability.difficulty(Difficulty::Bronze), 2);
        assert_eq!(availability.keyword_counts.get("vegetarian"), Some(&2));
        assert_eq!(availability.keyword_counts.get("gluten-free"), Some(&2));
        assert_eq!(availability.total_available, 4);
    }

    #[test]
    fn test_keyword_filter_only_limits_total() {
        let criteria = PlannerCriteria {
            keywords: vec!["gluten-free".to_string()],
            ..Default::default()
        };
        let availability = count_available(&criteria, &catalog());
        assert_eq!(availability.total_available, 2);
        assert_eq!(availability.difficulty(Difficulty::Gold), 1);
    }

    #[test]
    fn test_pack_filter_and_clamping() {
        let criteria = PlannerCriteria { packs: vec!["winter".to_string()], ..Default::default() };
        let availability = count_available(&criteria, &catalog());
        assert_eq!(availability.total_available, 1);
        assert_eq!(availability.clamp_meal_count(7), 1);
        assert_eq!(availability.clamp_category(Category::RedMeat, 3), 1);
        assert_eq!(availability.clamp_category(Category::Fish, 3), 0);
    }

    #[test]
    fn test_clamp_criteria_caps_quotas_and_meals() {
        let criteria = PlannerCriteria {
            categories: QuotaMap::default().with(Category::Vegan, 3).with(Category::Chicken, 2),
            difficulty: QuotaMap::default().with(Difficulty::Bronze, 5).with(Difficulty::Gold, 1),
            ..Default::default()
        }
        .with_meal_count(u32::MAX);
        let availability = count_available(&criteria, &catalog());

        let clamped = availability.clamp_criteria(&criteria);
        assert_eq!(clamped.categories.need(Category::Vegan), 1);
        assert_eq!(clamped.categories.need(Category::Chicken), 0);
        assert!(!clamped.categories.specific.contains_key(&Category::Chicken));
        assert_eq!(clamped.difficulty.need(Difficulty::Bronze), 2);
        assert_eq!(clamped.difficulty.need(Difficulty::Gold), 1);
        assert_eq!(clamped.total_meals(), 4);
        assert_eq!(clamped.categories.any, 3);
        assert_eq!(clamped.difficulty.any, 1);
    }
}
