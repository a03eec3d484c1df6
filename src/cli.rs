use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::planner::{PlannerCriteria, QuotaMap};
use crate::recipe::{Category, Difficulty};

#[derive(Parser, Debug)]
#[command(author, version, about = "Plan meals from recipe decks and shop for them", long_about = None)]
pub struct Cli {
    /// Directory holding recipe pack JSON files (overrides MEALDECK_DATA_DIR)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Directory where plans, pantry and lists are saved (overrides MEALDECK_STATE_DIR)
    #[arg(long, global = true)]
    pub state_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List recipe packs
    Packs,
    /// Search recipes by name, summary, keyword or category
    Search { query: String },
    /// Show how many recipes match the given packs and keywords
    Counts(CriteriaArgs),
    /// Draw a new hand of recipes
    Generate {
        #[command(flatten)]
        criteria: CriteriaArgs,
        /// Add to the current hand instead of replacing it
        #[arg(long)]
        append: bool,
    },
    /// Swap one recipe in the hand for another of the same difficulty
    Reroll {
        slug: String,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Show or edit the current hand
    Hand {
        #[command(subcommand)]
        action: Option<HandCommand>,
    },
    /// Move the hand onto the calendar
    Schedule {
        /// First day to use when the calendar is empty (defaults to today)
        #[arg(long)]
        start: Option<NaiveDate>,
    },
    /// Show or edit scheduled meals
    Calendar {
        #[command(subcommand)]
        action: Option<CalendarCommand>,
    },
    /// Build, edit and export the shopping list
    Shopping {
        #[command(subcommand)]
        action: Option<ShoppingCommand>,
    },
    /// Manage ingredients already at home
    Pantry {
        #[command(subcommand)]
        action: Option<PantryCommand>,
    },
}

#[derive(Subcommand, Debug)]
pub enum HandCommand {
    Show,
    Clear,
    /// Add a recipe by slug
    Add { slug: String },
    Remove { slug: String },
}

#[derive(Subcommand, Debug)]
pub enum CalendarCommand {
    Show,
    /// Exchange the meals of two days
    Swap { first: NaiveDate, second: NaiveDate },
    Remove { date: NaiveDate },
    Clear,
}

#[derive(Subcommand, Debug)]
pub enum ShoppingCommand {
    /// Collect ingredients of scheduled days (all filled days when none given)
    Generate { days: Vec<NaiveDate> },
    Show,
    Add { name: String, quantity: String },
    Remove { name: String },
    /// Rename an item and replace its comma-separated quantities
    Edit {
        name: String,
        new_name: String,
        quantities: String,
    },
    Clear,
    /// Set the list title
    Title { title: String },
    Export {
        #[arg(long, value_enum, default_value_t = ExportFormat::Text)]
        format: ExportFormat,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum PantryCommand {
    List,
    Add { name: String, quantity: String },
    Remove { id: String },
    Edit {
        id: String,
        name: String,
        quantity: String,
    },
    /// Whether pantry stock is subtracted from the shopping list
    Exclude {
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Text,
    Csv,
}

#[derive(Args, Debug, Clone, Default)]
pub struct CriteriaArgs {
    /// Pack slug to draw from (repeatable, default all packs)
    #[arg(long = "pack")]
    pub packs: Vec<String>,
    /// Keyword every recipe must have (repeatable)
    #[arg(long = "keyword")]
    pub keywords: Vec<String>,
    /// Number of meals; raised to the sum of the quotas below if smaller
    #[arg(short, long, default_value_t = 7)]
    pub meals: u32,
    #[arg(long, default_value_t = 0)]
    pub bronze: u32,
    #[arg(long, default_value_t = 0)]
    pub silver: u32,
    #[arg(long, default_value_t = 0)]
    pub gold: u32,
    #[arg(long, default_value_t = 0)]
    pub vegan: u32,
    #[arg(long, default_value_t = 0)]
    pub vegetarian: u32,
    #[arg(long, default_value_t = 0)]
    pub chicken: u32,
    #[arg(long, default_value_t = 0)]
    pub fish: u32,
    #[arg(long, default_value_t = 0)]
    pub red_meat: u32,
    /// Seed for a reproducible draw
    #[arg(long)]
    pub seed: Option<u64>,
}

impl CriteriaArgs {
    pub fn to_criteria(&self) -> PlannerCriteria {
        let difficulty = QuotaMap::default()
            .with(Difficulty::Bronze, self.bronze)
            .with(Difficulty::Silver, self.silver)
            .with(Difficulty::Gold, self.gold);
        let categories = QuotaMap::default()
            .with(Category::Vegan, self.vegan)
            .with(Category::Vegetarian, self.vegetarian)
            .with(Category::Chicken, self.chicken)
            .with(Category::Fish, self.fish)
            .with(Category::RedMeat, self.red_meat);

        let meals = self
            .meals
            .max(difficulty.specific_total())
            .max(categories.specific_total());

        PlannerCriteria {
            packs: self.packs.clone(),
            keywords: self.keywords.clone(),
            difficulty,
            categories,
        }
        .with_meal_count(meals)
    }
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
