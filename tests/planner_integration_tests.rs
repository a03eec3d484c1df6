use chrono::NaiveDate;
use std::collections::HashSet;
use std::fs;
use tempfile::TempDir;

use mealdeck::catalog::{FileCatalog, RecipeCatalog};
use mealdeck::logging;
use mealdeck::planner::{InOrder, MealPlan, MealPlanner, PlanError, PlannerCriteria, QuotaMap, RngSource};
use mealdeck::recipe::{Category, Difficulty};
use mealdeck::shopping::reconcile;
use mealdeck::storage::{AppStore, JsonFileStore};

const WEEKNIGHT_PACK: &str = r#"{
  "_id": "pack-weeknight",
  "name": "Weeknight",
  "slug": { "current": "weeknight" },
  "recipes": [
    { "name": "Tomato Soup", "slug": "tomato-soup", "difficulty": "bronze", "categories": ["vegan"],
      "ingredients": [
        { "name": "Tomatoes", "quantity": "2 dl" },
        { "name": "Onion", "quantity": "1" }
      ] },
    { "name": "Lemon Chicken", "slug": "lemon-chicken", "difficulty": "silver", "categories": ["chicken"],
      "ingredients": [ { "name": "Chicken thighs", "quantity": "600 g" } ] },
    { "name": "Baked Cod", "slug": "baked-cod", "difficulty": "silver", "categories": ["fish"],
      "ingredients": [ { "name": "Cod", "quantity": "0.5 kg" }, { "name": "tomatoes", "quantity": "1 dl" } ] },
    { "name": "Mushroom Risotto", "slug": "mushroom-risotto", "difficulty": "gold", "categories": ["vegetarian"],
      "keywords": ["comfort"],
      "ingredients": [ { "name": "Rice", "quantity": "300 g" } ] }
  ]
}"#;

const WEEKEND_PACK: &str = r#"{
  "name": "Weekend",
  "slug": "weekend",
  "recipes": [
    { "name": "Beef Ragu", "slug": "beef-ragu", "difficulty": "gold", "categories": ["red-meat"],
      "keywords": ["comfort"],
      "ingredients": [ { "name": "Beef mince", "quantity": "500 g" } ] },
    { "name": "Chickpea Curry", "slug": "chickpea-curry", "difficulty": "bronze", "categories": ["vegan"],
      "ingredients": [ { "name": "Chickpeas", "quantity": "2 can" } ] }
  ]
}"#;

fn setup_catalog() -> TempDir {
    logging::init_test();
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("weeknight.json"), WEEKNIGHT_PACK).unwrap();
    fs::write(dir.path().join("weekend.json"), WEEKEND_PACK).unwrap();
    dir
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[tokio::test]
async fn test_generate_from_file_catalog_meets_quotas() {
    let dir = setup_catalog();
    let planner = MealPlanner::new(FileCatalog::new(dir.path()));

    let criteria = PlannerCriteria {
        categories: QuotaMap::default().with(Category::Vegan, 2).with(Category::Fish, 1),
        difficulty: QuotaMap::default().with(Difficulty::Silver, 1),
        ..Default::default()
    }
    .with_meal_count(4);

    for seed in 0..10 {
        let plan = planner
            .generate(&criteria, &HashSet::new(), &mut RngSource::seeded(seed))
            .await
            .unwrap();
        assert_eq!(plan.len(), 4);
        assert_eq!(plan.slugs().iter().collect::<HashSet<_>>().len(), 4);
        assert_eq!(plan.count_by_category().get(&Category::Vegan), Some(&2));
        assert_eq!(plan.count_by_category().get(&Category::Fish), Some(&1));
    }
}

#[tokio::test]
async fn test_pack_and_keyword_filters_limit_the_pool() {
    let dir = setup_catalog();
    let planner = MealPlanner::new(FileCatalog::new(dir.path()));

    let criteria = PlannerCriteria {
        keywords: vec!["Comfort".to_string()],
        ..Default::default()
    }
    .with_meal_count(2);
    let availability = planner.counts(&criteria).await.unwrap();
    assert_eq!(availability.total_available, 2);

    let plan = planner.generate(&criteria, &HashSet::new(), &mut InOrder).await.unwrap();
    let slugs: HashSet<String> = plan.slugs().into_iter().collect();
    assert!(slugs.contains("mushroom-risotto"));
    assert!(slugs.contains("beef-ragu"));

    let too_many = criteria.clone().with_meal_count(3);
    let result = planner.generate(&too_many, &HashSet::new(), &mut InOrder).await;
    assert!(matches!(result, Err(PlanError::Unsatisfiable { filled: 2, requested: 3 })));
}

#[tokio::test]
async fn test_reroll_keeps_difficulty() {
    let dir = setup_catalog();
    let planner = MealPlanner::new(FileCatalog::new(dir.path()));
    let catalog = planner.catalog();

    let mut hand = MealPlan::new();
    hand.add(catalog.recipe_by_slug("lemon-chicken").await.unwrap().unwrap());
    hand.add(catalog.recipe_by_slug("tomato-soup").await.unwrap().unwrap());

    let criteria = PlannerCriteria::default();
    let replacement = planner
        .reroll(&criteria, &hand, "lemon-chicken", &mut RngSource::seeded(7))
        .await
        .unwrap();
    assert_eq!(replacement.slug, "baked-cod");
    assert_eq!(replacement.difficulty, Difficulty::Silver);

    hand.replace("lemon-chicken", replacement);
    hand.add(catalog.recipe_by_slug("lemon-chicken").await.unwrap().unwrap());
    let result = planner
        .reroll(&criteria, &hand, "baked-cod", &mut RngSource::seeded(7))
        .await;
    assert!(matches!(result, Err(PlanError::NoAlternative { .. })));
}

#[tokio::test]
async fn test_plan_to_shopping_list_round_trip() {
    let dir = setup_catalog();
    let state = TempDir::new().unwrap();
    let catalog = FileCatalog::new(dir.path());
    let store = AppStore::new(JsonFileStore::new(state.path()));

    let mut hand = MealPlan::new();
    hand.add(catalog.recipe_by_slug("tomato-soup").await.unwrap().unwrap());
    hand.add(catalog.recipe_by_slug("baked-cod").await.unwrap().unwrap());
    store.save_draft_plan(&hand).await.unwrap();

    let mut calendar = store.calendar().await.unwrap();
    let dates = calendar.schedule(&store.draft_plan().await.unwrap(), date("2024-06-03"));
    assert_eq!(dates, vec![date("2024-06-03"), date("2024-06-04")]);
    store.save_calendar(&calendar).await.unwrap();

    let calendar = store.calendar().await.unwrap();
    let required = calendar.ingredients_for(&dates);
    store.save_shopping_list(&required).await.unwrap();

    let mut pantry = store.pantry().await.unwrap();
    pantry.add("Tomatoes", "2 dl").unwrap();
    pantry.add("Cod", "2 pcs").unwrap();
    store.save_pantry(&pantry).await.unwrap();

    let pantry = store.pantry().await.unwrap();
    let residual = reconcile(
        &store.shopping_list().await.unwrap(),
        pantry.items(),
        store.exclude_pantry().await.unwrap(),
    );
    assert_eq!(residual.quantities("tomatoes").unwrap()[0], "1 dl");
    assert_eq!(residual.quantities("cod").unwrap()[0], "500 g");
    assert_eq!(residual.quantities("onion").unwrap()[0], "1");

    let next = calendar.clone().schedule(&hand, date("2024-06-10"));
    assert_eq!(next[0], date("2024-06-05"));
}
