use std::collections::HashSet;
use tracing::{debug, info};

use super::random::{shuffle, RandomSource};
use super::{MealPlan, PlanError, PlannerCriteria, QuotaMap};
use crate::recipe::{Category, Difficulty, Recipe, PRIMARY_CATEGORY_ORDER};

const PERFECT_SCORE: u8 = 2;

/// Remaining needs for one generation run.
struct Needs {
    difficulty: QuotaMap<Difficulty>,
    categories: QuotaMap<Category>,
}

impl Needs {
    fn from_criteria(criteria: &PlannerCriteria) -> Self {
        Self {
            difficulty: criteria.difficulty.clone(),
            categories: criteria.categories.clone(),
        }
    }

    /// First category (in priority order) of `recipe` with an open specific need.
    fn open_category(&self, recipe: &Recipe) -> Option<Category> {
        PRIMARY_CATEGORY_ORDER
            .into_iter()
            .find(|category| self.categories.need(*category) > 0 && recipe.in_category(*category))
    }

    fn score(&self, recipe: &Recipe) -> u8 {
        let mut score = 0;
        if self.difficulty.need(recipe.difficulty) > 0 {
            score += 1;
        }
        if self.open_category(recipe).is_some() {
            score += 1;
        }
        score
    }

    fn has_any_capacity(&self) -> bool {
        self.difficulty.any > 0 || self.categories.any > 0
    }

    fn consume(&mut self, recipe: &Recipe) {
        if !self.difficulty.take(recipe.difficulty) {
            self.difficulty.take_any();
        }
        let category_taken = match self.open_category(recipe) {
            Some(category) => self.categories.take(category),
            None => false,
        };
        if !category_taken {
            self.categories.take_any();
        }
    }
}

/// Picks the best unused candidate for one slot, or `None` if the slot cannot be filled.
fn pick_candidate<'a>(
    pool: &[&'a Recipe],
    used: &HashSet<String>,
    needs: &Needs,
) -> Option<&'a Recipe> {
    let mut best: Option<(&Recipe, u8)> = None;
    for &candidate in pool {
        if used.contains(&candidate.slug) {
            continue;
        }
        let score = needs.score(candidate);
        if best.map_or(true, |(_, best_score)| score > best_score) {
            best = Some((candidate, score));
            if score == PERFECT_SCORE {
                break;
            }
        }
    }

    match best {
        Some((candidate, score)) if score > 0 => Some(candidate),
        // No specific need matched: only an open "any" bucket lets us take the
        // first unused candidate.
        Some(_) if needs.has_any_capacity() => {
            pool.iter().copied().find(|candidate| !used.contains(&candidate.slug))
        }
        _ => None,
    }
}

/// Generates a plan of distinct recipes matching the category and difficulty quotas
/// as closely as the catalog allows.
///
/// # Arguments
/// * `criteria`: pack/keyword filters and quota maps ("any" buckets already filled in).
/// * `catalog`: every recipe available.
/// * `already_used`: slugs that must not be picked again (when extending a plan).
/// * `random`: shuffles the candidate pool.
///
/// # Returns
/// The full plan, or `PlanError::Unsatisfiable` if any slot cannot be filled.
/// A partial plan is never returned.
pub fn generate(
    criteria: &PlannerCriteria,
    catalog: &[Recipe],
    already_used: &HashSet<String>,
    random: &mut dyn RandomSource,
) -> Result<MealPlan, PlanError> {
    let pool: Vec<&Recipe> = super::eligible_pool(criteria, catalog)
        .into_iter()
        .filter(|recipe| !already_used.contains(&recipe.slug))
        .collect();
    let pool = shuffle(pool, random);

    let total_meals = criteria.total_meals() as usize;
    debug!(pool = pool.len(), total_meals, "generating meal plan");

    let mut needs = Needs::from_criteria(criteria);
    let mut used: HashSet<String> = HashSet::new();
    let mut picks: Vec<Recipe> = Vec::with_capacity(total_meals.min(pool.len()));

    for slot in 0..total_meals {
        let Some(pick) = pick_candidate(&pool, &used, &needs) else {
            info!(filled = slot, requested = total_meals, "meal plan criteria cannot be satisfied");
            return Err(PlanError::Unsatisfiable { filled: slot, requested: total_meals });
        };
        debug!(slot, slug = %pick.slug, difficulty = %pick.difficulty, "picked recipe");

        needs.consume(pick);
        used.insert(pick.slug.clone());
        picks.push(pick.clone());
    }

    info!(meals = picks.len(), "meal plan generated");
    Ok(MealPlan::from(picks))
}
