use tracing::{debug, info};

use super::random::RandomSource;
use super::{PlanError, PlannerCriteria};
use crate::recipe::{Category, Difficulty, Recipe};

/// Finds a replacement for one plan entry.
///
/// The replacement always keeps the replaced recipe's difficulty. It also keeps
/// the replaced recipe's primary category when that category was explicitly
/// requested in the criteria, falling back to any eligible recipe otherwise.
pub fn reroll<S: AsRef<str>>(
    criteria: &PlannerCriteria,
    catalog: &[Recipe],
    current_plan_slugs: &[S],
    slug_to_replace: &str,
    categories_of_replaced: &[S],
    difficulty_of_replaced: Difficulty,
    random: &mut dyn RandomSource,
) -> Result<Recipe, PlanError> {
    let in_plan = |recipe: &Recipe| {
        recipe.slug == slug_to_replace
            || current_plan_slugs.iter().any(|slug| slug.as_ref() == recipe.slug)
    };

    let available: Vec<&Recipe> = super::eligible_pool(criteria, catalog)
        .into_iter()
        .filter(|recipe| !in_plan(recipe) && recipe.difficulty == difficulty_of_replaced)
        .collect();

    let primary = Category::primary_of(categories_of_replaced)
        .filter(|category| criteria.categories.need(*category) > 0);

    let restricted: Vec<&Recipe> = match primary {
        Some(category) => available
            .iter()
            .copied()
            .filter(|recipe| recipe.in_category(category))
            .collect(),
        None => Vec::new(),
    };

    let candidates = if restricted.is_empty() { available } else { restricted };
    debug!(
        slug = slug_to_replace,
        primary = ?primary,
        candidates = candidates.len(),
        "rerolling plan entry"
    );

    if candidates.is_empty() {
        info!(slug = slug_to_replace, "no alternative recipe found");
        return Err(PlanError::NoAlternative { slug: slug_to_replace.to_string() });
    }

    let choice = candidates[random.pick(candidates.len())];
    Ok(choice.clone())
}
