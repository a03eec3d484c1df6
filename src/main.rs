use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use std::io::Write;
use tracing::warn;

use mealdeck::calendar::MealCalendar;
use mealdeck::catalog::{CmsCatalog, FileCatalog, RecipeCatalog};
use mealdeck::cli::{
    parse_args, CalendarCommand, Command, CriteriaArgs, ExportFormat, HandCommand, PantryCommand,
    ShoppingCommand,
};
use mealdeck::config::{AppConfig, CatalogSource};
use mealdeck::logging;
use mealdeck::planner::{MealPlan, MealPlanner, RngSource};
use mealdeck::recipe::Recipe;
use mealdeck::shopping::{reconcile, ShoppingList};
use mealdeck::storage::{AppStore, JsonFileStore};

type Planner = MealPlanner<Box<dyn RecipeCatalog>>;
type Store = AppStore<JsonFileStore>;

fn random_source(seed: Option<u64>) -> RngSource<rand::rngs::StdRng> {
    match seed {
        Some(seed) => RngSource::seeded(seed),
        None => RngSource::from_entropy(),
    }
}

fn describe(recipe: &Recipe) -> String {
    let categories = if recipe.categories.is_empty() {
        String::new()
    } else {
        format!(" [{}]", recipe.categories.join(", "))
    };
    format!("{} ({}, {}){}", recipe.name, recipe.slug, recipe.difficulty, categories)
}

fn print_hand(hand: &MealPlan) {
    if hand.is_empty() {
        println!("Your hand is empty. Run `mealdeck generate` to draw recipes.");
        return;
    }
    for (idx, recipe) in hand.recipes().iter().enumerate() {
        println!("{:>2}. {}", idx + 1, describe(recipe));
    }
}

fn print_calendar(calendar: &MealCalendar) {
    if calendar.days().is_empty() {
        println!("Nothing scheduled.");
        return;
    }
    for (date, recipe) in calendar.days() {
        match recipe {
            Some(recipe) => println!("{}  {}", date, describe(recipe)),
            None => println!("{}  -", date),
        }
    }
}

async fn print_shopping_list(store: &Store) -> Result<()> {
    let title = store.shopping_list_title().await?;
    let list = residual_list(store).await?;
    println!("{}", title);
    if list.is_empty() {
        println!("(empty)");
    } else {
        println!("{}", list.to_text());
    }
    Ok(())
}

/// The stored list minus pantry stock, when that preference is on.
async fn residual_list(store: &Store) -> Result<ShoppingList> {
    let required = store.shopping_list().await?;
    let pantry = store.pantry().await?;
    let exclude = store.exclude_pantry().await?;
    Ok(reconcile(&required, pantry.items(), exclude))
}

async fn run_generate(planner: &Planner, store: &Store, args: &CriteriaArgs, append: bool) -> Result<()> {
    let requested = args.to_criteria();
    let availability = planner.counts(&requested).await.context("Failed to count recipes")?;
    let criteria = availability.clamp_criteria(&requested);
    if criteria != requested {
        warn!(
            requested = requested.total_meals(),
            available = availability.total_available,
            "quotas lowered to what the selected packs offer"
        );
    }
    if criteria.total_meals() == 0 {
        bail!("Nothing to plan: ask for at least one meal from packs that have recipes");
    }

    let mut hand = if append { store.draft_plan().await? } else { MealPlan::new() };
    let mut random = random_source(args.seed);
    let drawn = planner
        .generate(&criteria, &hand.used_slugs(), &mut random)
        .await
        .context("Failed to generate meal plan")?;

    let added = hand.extend(drawn);
    store.save_draft_plan(&hand).await?;
    store.save_last_criteria(&criteria).await?;
    println!("Drew {} recipe(s):", added);
    print_hand(&hand);
    let mix: Vec<String> = hand
        .count_by_difficulty()
        .iter()
        .map(|(difficulty, count)| format!("{} {}", count, difficulty))
        .collect();
    println!("Difficulty mix: {}", mix.join(", "));
    Ok(())
}

async fn run_reroll(planner: &Planner, store: &Store, slug: &str, seed: Option<u64>) -> Result<()> {
    let mut hand = store.draft_plan().await?;
    if !hand.contains(slug) {
        bail!("'{}' is not in your hand", slug);
    }
    let criteria = store.last_criteria().await?.unwrap_or_default();
    let mut random = random_source(seed);
    let replacement = planner
        .reroll(&criteria, &hand, slug, &mut random)
        .await
        .with_context(|| format!("Failed to reroll '{}'", slug))?;

    println!("Replaced {} with {}", slug, describe(&replacement));
    hand.replace(slug, replacement);
    store.save_draft_plan(&hand).await?;
    Ok(())
}

async fn run_hand(planner: &Planner, store: &Store, action: HandCommand) -> Result<()> {
    let mut hand = store.draft_plan().await?;
    match action {
        HandCommand::Show => {}
        HandCommand::Clear => hand.clear(),
        HandCommand::Add { slug } => {
            let recipe = planner
                .catalog()
                .recipe_by_slug(&slug)
                .await?
                .with_context(|| format!("No recipe with slug '{}'", slug))?;
            if !hand.add(recipe) {
                println!("'{}' is already in your hand", slug);
            }
        }
        HandCommand::Remove { slug } => {
            if hand.remove(&slug).is_none() {
                bail!("'{}' is not in your hand", slug);
            }
        }
    }
    store.save_draft_plan(&hand).await?;
    print_hand(&hand);
    Ok(())
}

async fn run_schedule(store: &Store, start: Option<NaiveDate>) -> Result<()> {
    let hand = store.draft_plan().await?;
    if hand.is_empty() {
        bail!("Your hand is empty; nothing to schedule");
    }
    let mut calendar = store.calendar().await?;
    let today = start.unwrap_or_else(|| Local::now().date_naive());
    let dates = calendar.schedule(&hand, today);
    store.save_calendar(&calendar).await?;
    store.save_draft_plan(&MealPlan::new()).await?;
    if let (Some(first), Some(last)) = (dates.first(), dates.last()) {
        println!("Scheduled {} meal(s) from {} to {}", dates.len(), first, last);
    }
    Ok(())
}

async fn run_calendar(store: &Store, action: CalendarCommand) -> Result<()> {
    let mut calendar = store.calendar().await?;
    match action {
        CalendarCommand::Show => {}
        CalendarCommand::Swap { first, second } => calendar.swap(first, second),
        CalendarCommand::Remove { date } => {
            calendar.remove_day(date);
        }
        CalendarCommand::Clear => calendar.clear(),
    }
    if calendar.days().is_empty() {
        store.clear_calendar().await?;
    } else {
        store.save_calendar(&calendar).await?;
    }
    print_calendar(&calendar);
    Ok(())
}

async fn run_shopping(store: &Store, action: ShoppingCommand) -> Result<()> {
    match action {
        ShoppingCommand::Generate { days } => {
            let calendar = store.calendar().await?;
            let days = if days.is_empty() {
                calendar
                    .days()
                    .iter()
                    .filter(|(_, recipe)| recipe.is_some())
                    .map(|(date, _)| *date)
                    .collect()
            } else {
                days
            };
            if days.is_empty() {
                bail!("No scheduled meals to shop for");
            }
            let list = calendar.ingredients_for(&days);
            store.save_shopping_list(&list).await?;
            print_shopping_list(store).await?;
        }
        ShoppingCommand::Show => print_shopping_list(store).await?,
        ShoppingCommand::Add { name, quantity } => {
            let mut list = store.shopping_list().await?;
            list.add_item(&name, &quantity);
            store.save_shopping_list(&list).await?;
            print_shopping_list(store).await?;
        }
        ShoppingCommand::Remove { name } => {
            let mut list = store.shopping_list().await?;
            if !list.remove_item(&name) {
                bail!("'{}' is not on the list", name);
            }
            store.save_shopping_list(&list).await?;
            print_shopping_list(store).await?;
        }
        ShoppingCommand::Edit { name, new_name, quantities } => {
            let mut list = store.shopping_list().await?;
            if !list.edit_item(&name, &new_name, &quantities) {
                bail!("'{}' is not on the list", name);
            }
            store.save_shopping_list(&list).await?;
            print_shopping_list(store).await?;
        }
        ShoppingCommand::Clear => {
            store.clear_shopping_list().await?;
            println!("Shopping list cleared.");
        }
        ShoppingCommand::Title { title } => {
            store.save_shopping_list_title(title.trim()).await?;
            print_shopping_list(store).await?;
        }
        ShoppingCommand::Export { format, output } => {
            let list = residual_list(store).await?;
            let mut buffer = Vec::new();
            match format {
                ExportFormat::Text => {
                    writeln!(buffer, "{}", store.shopping_list_title().await?)?;
                    writeln!(buffer, "{}", list.to_text())?;
                }
                ExportFormat::Csv => list.write_csv(&mut buffer).context("Failed to write CSV")?,
            }
            match output {
                Some(path) => {
                    tokio::fs::write(&path, &buffer)
                        .await
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Exported {} item(s) to {}", list.len(), path.display());
                }
                None => std::io::stdout().write_all(&buffer)?,
            }
        }
    }
    Ok(())
}

async fn run_pantry(store: &Store, action: PantryCommand) -> Result<()> {
    let mut pantry = store.pantry().await?;
    match action {
        PantryCommand::List => {}
        PantryCommand::Add { name, quantity } => {
            pantry.add(&name, &quantity)?;
        }
        PantryCommand::Remove { id } => {
            if !pantry.remove(&id) {
                bail!("No pantry item with id '{}'", id);
            }
        }
        PantryCommand::Edit { id, name, quantity } => {
            if !pantry.edit(&id, &name, &quantity)? {
                bail!("No pantry item with id '{}'", id);
            }
        }
        PantryCommand::Exclude { enabled } => {
            store.save_exclude_pantry(enabled).await?;
            println!(
                "Pantry items are {} the shopping list.",
                if enabled { "subtracted from" } else { "ignored by" }
            );
            return Ok(());
        }
    }
    store.save_pantry(&pantry).await?;
    if pantry.is_empty() {
        println!("Your pantry is empty.");
    }
    for item in pantry.items() {
        println!("{}  {} ({})", item.id, item.name, item.quantity);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    logging::init();

    let cli = parse_args();
    let mut config = AppConfig::from_env().context("Invalid configuration")?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(dir) = cli.state_dir {
        config.state_dir = dir;
    }

    let catalog: Box<dyn RecipeCatalog> = match config.catalog {
        CatalogSource::Files => Box::new(FileCatalog::new(&config.data_dir)),
        CatalogSource::Cms(cms) => Box::new(CmsCatalog::new(cms)),
    };
    let planner = MealPlanner::new(catalog);
    let store = AppStore::new(JsonFileStore::new(&config.state_dir));

    match cli.command {
        Command::Packs => {
            let packs = planner.catalog().all_packs().await.context("Failed to load recipe packs")?;
            for pack in &packs {
                println!("{} ({}): {} recipe(s)", pack.name, pack.slug, pack.recipes.len());
            }
        }
        Command::Search { query } => {
            let found = planner.catalog().search(&query).await.context("Search failed")?;
            if found.is_empty() {
                println!("No recipes match '{}'.", query);
            }
            for recipe in &found {
                println!("{}", describe(recipe));
            }
        }
        Command::Counts(args) => {
            let availability = planner.counts(&args.to_criteria()).await?;
            println!("{}", serde_json::to_string_pretty(&availability)?);
        }
        Command::Generate { criteria, append } => run_generate(&planner, &store, &criteria, append).await?,
        Command::Reroll { slug, seed } => run_reroll(&planner, &store, &slug, seed).await?,
        Command::Hand { action } => run_hand(&planner, &store, action.unwrap_or(HandCommand::Show)).await?,
        Command::Schedule { start } => run_schedule(&store, start).await?,
        Command::Calendar { action } => run_calendar(&store, action.unwrap_or(CalendarCommand::Show)).await?,
        Command::Shopping { action } => run_shopping(&store, action.unwrap_or(ShoppingCommand::Show)).await?,
        Command::Pantry { action } => run_pantry(&store, action.unwrap_or(PantryCommand::List)).await?,
    }

    Ok(())
}
