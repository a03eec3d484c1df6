use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

use crate::planner::MealPlan;
use crate::recipe::Recipe;
use crate::shopping::ShoppingList;

/// Scheduled meals by date. A date mapped to `None` is a day kept open.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct MealCalendar {
    days: BTreeMap<NaiveDate, Option<Recipe>>,
}

impl MealCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn days(&self) -> &BTreeMap<NaiveDate, Option<Recipe>> {
        &self.days
    }

    pub fn get(&self, date: NaiveDate) -> Option<&Recipe> {
        self.days.get(&date).and_then(Option::as_ref)
    }

    /// True when no date holds a recipe.
    pub fn is_empty(&self) -> bool {
        self.days.values().all(Option::is_none)
    }

    pub fn last_filled_date(&self) -> Option<NaiveDate> {
        self.days
            .iter()
            .rev()
            .find(|(_, recipe)| recipe.is_some())
            .map(|(date, _)| *date)
    }

    /// Puts the plan's recipes on consecutive days, starting the day after the
    /// last filled date or on `today` for an empty calendar.
    pub fn schedule(&mut self, plan: &MealPlan, today: NaiveDate) -> Vec<NaiveDate> {
        let start = self
            .last_filled_date()
            .and_then(|last| last.checked_add_days(Days::new(1)))
            .unwrap_or(today);

        let mut scheduled = Vec::with_capacity(plan.len());
        let mut date = start;
        for recipe in plan.recipes() {
            self.days.insert(date, Some(recipe.clone()));
            scheduled.push(date);
            match date.succ_opt() {
                Some(next) => date = next,
                None => break,
            }
        }
        info!(meals = scheduled.len(), start = %start, "scheduled meal plan");
        scheduled
    }

    pub fn set(&mut self, date: NaiveDate, recipe: Option<Recipe>) {
        self.days.insert(date, recipe);
    }

    /// Exchanges the meals of two dates. Dates without an entry count as open days.
    pub fn swap(&mut self, a: NaiveDate, b: NaiveDate) {
        if a == b {
            return;
        }
        let first = self.days.remove(&a).flatten();
        let second = self.days.remove(&b).flatten();
        self.days.insert(a, second);
        self.days.insert(b, first);
    }

    pub fn remove_day(&mut self, date: NaiveDate) -> Option<Recipe> {
        self.days.remove(&date).flatten()
    }

    pub fn clear(&mut self) {
        self.days.clear();
    }

    /// Raw shopping list for the meals on the selected days.
    pub fn ingredients_for(&self, days: &[NaiveDate]) -> ShoppingList {
        ShoppingList::from_ingredients(
            days.iter()
                .filter_map(|date| self.get(*date))
                .flat_map(|recipe| recipe.ingredients.iter()),
        )
    }
}
