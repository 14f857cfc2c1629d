use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::metadata::{PKG_DESCRIPTION, PKG_NAME, PKG_VERSION};
use crate::nutrition::WorkoutEntry;
use crate::types::{Nutrient, Nutrients, Sex};

#[derive(Parser, Debug, Clone)]
#[command(name = PKG_NAME)]
#[command(version = PKG_VERSION)]
#[command(about = PKG_DESCRIPTION, long_about = None)]
pub struct Cli {
    /// Directory holding foods.json, profile.json, settings.json and macro_log.csv
    #[arg(long, global = true, env = "MACRO_MANAGER_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Manage the food library
    #[command(subcommand)]
    Foods(FoodsCommand),
    /// Show or update the body profile used for burn estimates
    #[command(subcommand)]
    Profile(ProfileCommand),
    /// Build today's meal, show the dashboard and optionally save it to the log
    Day(DayArguments),
    /// Print saved days in date order
    Trends(TrendsArguments),
    /// List the dates that have a saved log entry, newest first
    Days,
    /// Open an interactive editor for dashboard targets (settings.json)
    Config,
    /// Print version information
    Version,
}

#[derive(Subcommand, Debug, Clone)]
pub enum FoodsCommand {
    /// List foods with their per-serving values
    List,
    /// Add a new food
    Add {
        name: String,
        #[command(flatten)]
        nutrients: NutrientArguments,
    },
    /// Change some values of an existing food
    Edit {
        name: String,
        #[command(flatten)]
        nutrients: NutrientArguments,
    },
    /// Delete one or more foods
    Delete {
        #[arg(required = true)]
        names: Vec<String>,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct NutrientArguments {
    /// Protein (g)
    #[arg(long, value_parser = parse_amount)]
    pub protein: Option<f64>,
    /// Fat (g)
    #[arg(long, value_parser = parse_amount)]
    pub fat: Option<f64>,
    /// Carbohydrate (g)
    #[arg(long, value_parser = parse_amount)]
    pub carb: Option<f64>,
    /// Fiber (g)
    #[arg(long, value_parser = parse_amount)]
    pub fiber: Option<f64>,
    /// Added sugar (g)
    #[arg(long, value_parser = parse_amount)]
    pub added_sugar: Option<f64>,
    /// Sodium (mg)
    #[arg(long, value_parser = parse_amount)]
    pub sodium: Option<f64>,
    /// Potassium (mg)
    #[arg(long, value_parser = parse_amount)]
    pub potassium: Option<f64>,
}

impl NutrientArguments {
    fn pairs(&self) -> [(Nutrient, Option<f64>); 7] {
        [
            (Nutrient::Protein, self.protein),
            (Nutrient::Fat, self.fat),
            (Nutrient::Carb, self.carb),
            (Nutrient::Fiber, self.fiber),
            (Nutrient::AddedSugar, self.added_sugar),
            (Nutrient::Sodium, self.sodium),
            (Nutrient::Potassium, self.potassium),
        ]
    }

    /// Values given on the command line laid over `base`.
    pub fn apply_to(&self, base: Nutrients) -> Nutrients {
        let mut out = base;
        for (nutrient, value) in self.pairs() {
            if let Some(v) = value {
                out.set(nutrient, v);
            }
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.pairs().iter().all(|(_, v)| v.is_none())
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum ProfileCommand {
    /// Print the stored profile and the resulting base burn
    Show,
    /// Update profile fields; unspecified fields keep their values
    Set {
        #[arg(long, value_enum)]
        sex: Option<Sex>,
        #[arg(long, value_parser = parse_amount)]
        age: Option<f64>,
        #[arg(long, value_parser = parse_amount)]
        height_cm: Option<f64>,
        #[arg(long, value_parser = parse_amount)]
        weight_kg: Option<f64>,
    },
}

/// `NAME=SERVINGS` on the command line.
#[derive(Clone, Debug, PartialEq)]
pub struct MealItem {
    pub name: String,
    pub servings: f64,
}

impl FromStr for MealItem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, servings) = match s.rsplit_once('=') {
            Some((name, qty)) => (name, parse_amount(qty)?),
            None => (s, 1.0),
        };
        let name = name.trim();
        if name.is_empty() {
            return Err(format!("Food name missing in '{s}'"));
        }
        Ok(Self {
            name: name.to_string(),
            servings,
        })
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct DayArguments {
    /// Food and servings as NAME=SERVINGS (servings default to 1); repeatable
    #[arg(long = "food", short = 'f')]
    pub foods: Vec<MealItem>,

    /// Workout adjustment as LABEL:KCAL or LABEL:KCAL:ERROR; repeatable
    #[arg(long = "workout", short = 'w', allow_hyphen_values = true)]
    pub workouts: Vec<WorkoutEntry>,

    /// Start from the foods saved for this date (YYYY-MM-DD)
    #[arg(long)]
    pub load: Option<NaiveDate>,

    /// Save the day to the log, replacing any entry for today
    #[arg(long, default_value_t = false)]
    pub save: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum TrendMetric {
    Calories,
    Burned,
    Net,
    Protein,
    Fat,
    Carbs,
}

#[derive(Args, Debug, Clone, Default)]
pub struct TrendsArguments {
    /// Metrics to show; all when omitted
    #[arg(long = "metric", short = 'm', value_enum)]
    pub metrics: Vec<TrendMetric>,
}

/// Non-negative, finite amount.
pub fn parse_amount(raw: &str) -> Result<f64, String> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("'{raw}' is not a number"))?;
    if !value.is_finite() || value < 0.0 {
        return Err(format!("'{raw}' must be a non-negative number"));
    }
    Ok(value)
}
