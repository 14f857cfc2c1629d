use std::fmt::Write as _;

use chrono::{Local, NaiveDate, SubsecRound};
use clap::ValueEnum;
use colored::Colorize;
use dialoguer::{Input, theme::ColorfulTheme};

use crate::cli::{
    Command, DayArguments, FoodsCommand, MealItem, NutrientArguments, ProfileCommand,
    TrendMetric, TrendsArguments,
};
use crate::config::{Settings, Targets};
use crate::dashboard::{Dashboard, totals_table};
use crate::error::{ServiceError, ServiceResult};
use crate::metadata::{PKG_NAME, PKG_VERSION};
use crate::nutrition::{EnergyBalance, Meal, restore_meal};
use crate::storage::{FoodCatalog, LogRow};
use crate::types::{Nutrient, Nutrients, UserProfile};

pub const MEAL_NAME: &str = "Today's Intake";

pub fn run(command: Command, settings: &mut Settings) -> ServiceResult<String> {
    match command {
        Command::Foods(cmd) => run_foods(cmd, settings),
        Command::Profile(cmd) => run_profile(cmd, settings),
        Command::Day(args) => run_day(&args, settings),
        Command::Trends(args) => run_trends(&args, settings),
        Command::Days => run_days(settings),
        Command::Config => run_config(settings),
        Command::Version => Ok(format!("{PKG_NAME} {PKG_VERSION}")),
    }
}

/// Trimmed, non-empty food name.
pub fn validate_food_name(name: &str) -> ServiceResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ServiceError::InvalidFoodName);
    }
    Ok(name)
}

fn validate_amounts(name: &str, nutrients: &Nutrients) -> ServiceResult<()> {
    if !nutrients.is_non_negative() {
        return Err(ServiceError::InvalidArgument(format!(
            "Nutrient amounts for {name} must be finite and not negative"
        )));
    }
    Ok(())
}

pub fn add_food(catalog: &mut FoodCatalog, name: &str, nutrients: Nutrients) -> ServiceResult<()> {
    let name = validate_food_name(name)?;
    if catalog.contains(name) {
        return Err(ServiceError::DuplicateFood(name.to_string()));
    }
    validate_amounts(name, &nutrients)?;
    catalog.put(name, nutrients);
    catalog.save()?;
    tracing::info!(food = name, "food added");
    Ok(())
}

pub fn edit_food(
    catalog: &mut FoodCatalog,
    name: &str,
    changes: &NutrientArguments,
) -> ServiceResult<Nutrients> {
    let name = validate_food_name(name)?;
    let current = catalog
        .get(name)
        .ok_or_else(|| ServiceError::FoodNotFound(name.to_string()))?
        .nutrients;
    let updated = changes.apply_to(current);
    validate_amounts(name, &updated)?;
    catalog.put(name, updated);
    catalog.save()?;
    tracing::info!(food = name, "food updated");
    Ok(updated)
}

pub fn delete_foods(catalog: &mut FoodCatalog, names: &[String]) -> ServiceResult<Vec<String>> {
    let removed = catalog.delete(names);
    if !removed.is_empty() {
        catalog.save()?;
        tracing::info!(foods = ?removed, "foods deleted");
    }
    Ok(removed)
}

fn describe_food(nutrients: &Nutrients) -> String {
    let parts: Vec<String> = Nutrient::ALL
        .iter()
        .filter(|n| nutrients.get(**n) != 0.0)
        .map(|n| format!("{} {}{}", n.as_str(), nutrients.get(*n), n.unit()))
        .collect();
    if parts.is_empty() {
        "(no nutrients)".to_string()
    } else {
        parts.join(", ")
    }
}

fn run_foods(cmd: FoodsCommand, settings: &Settings) -> ServiceResult<String> {
    let mut catalog = settings.catalog()?;
    match cmd {
        FoodsCommand::List => {
            if catalog.foods().is_empty() {
                return Ok("No foods yet. Add one with `foods add`.".to_string());
            }
            let mut out = String::new();
            for food in catalog.foods().values() {
                let _ = writeln!(
                    out,
                    "{:<24} {:>6.0} kcal  {}",
                    food.name.bold(),
                    food.nutrients.calories(),
                    describe_food(&food.nutrients)
                );
            }
            Ok(out)
        }
        FoodsCommand::Add { name, nutrients } => {
            add_food(&mut catalog, &name, nutrients.apply_to(Nutrients::default()))?;
            Ok(format!("Added {}", name.trim()))
        }
        FoodsCommand::Edit { name, nutrients } => {
            if nutrients.is_empty() {
                return Err(ServiceError::InvalidArgument(
                    "Nothing to change; pass at least one nutrient flag".to_string(),
                ));
            }
            let updated = edit_food(&mut catalog, &name, &nutrients)?;
            Ok(format!("Updated {}: {}", name.trim(), describe_food(&updated)))
        }
        FoodsCommand::Delete { names } => {
            let removed = delete_foods(&mut catalog, &names)?;
            if removed.is_empty() {
                Ok("Nothing deleted".to_string())
            } else {
                Ok(format!("Deleted {}", removed.join(", ")))
            }
        }
    }
}

fn describe_profile(profile: &UserProfile) -> String {
    let balance = EnergyBalance::compute(profile, &[]);
    format!(
        "sex: {}\nage: {}\nheight_cm: {}\nweight_kg: {}\nBMR: {:.0} kcal\nBase burn (sedentary TDEE, BMR x 1.2): {:.0} kcal",
        profile.sex,
        profile.age_years,
        profile.height_cm,
        profile.weight_kg,
        balance.bmr,
        balance.base_burn_kcal
    )
}

fn run_profile(cmd: ProfileCommand, settings: &Settings) -> ServiceResult<String> {
    let store = settings.profile_store();
    let mut profile = store.load()?;
    match cmd {
        ProfileCommand::Show => Ok(describe_profile(&profile)),
        ProfileCommand::Set {
            sex,
            age,
            height_cm,
            weight_kg,
        } => {
            if let Some(sex) = sex {
                profile.sex = sex;
            }
            if let Some(age) = age {
                profile.age_years = age;
            }
            if let Some(height) = height_cm {
                profile.height_cm = height;
            }
            if let Some(weight) = weight_kg {
                profile.weight_kg = weight;
            }
            let changed = store.save_if_changed(&profile)?;
            let status = if changed { "Profile saved" } else { "Profile unchanged" };
            Ok(format!("{status}\n{}", describe_profile(&profile)))
        }
    }
}

/// Builds the meal for `day`: the foods of `--load` first, then `--food`
/// items, which override the servings of a loaded food with the same name.
/// Zero-serving items are left out.
pub fn build_meal<'a>(
    catalog: &'a FoodCatalog,
    loaded_descriptor: Option<&str>,
    items: &[MealItem],
) -> ServiceResult<(Meal<'a>, Vec<String>)> {
    let (loaded, missing) = match loaded_descriptor {
        Some(descriptor) => restore_meal(MEAL_NAME, descriptor, catalog.foods()),
        None => (Meal::new(MEAL_NAME), Vec::new()),
    };

    let mut servings: Vec<(&'a str, f64)> = loaded
        .lines()
        .iter()
        .map(|line| (line.food.name.as_str(), line.servings))
        .collect();
    for item in items {
        let food = catalog
            .get(&item.name)
            .ok_or_else(|| ServiceError::FoodNotFound(item.name.clone()))?;
        match servings.iter_mut().find(|(name, _)| *name == food.name) {
            Some(entry) => entry.1 = item.servings,
            None => servings.push((food.name.as_str(), item.servings)),
        }
    }

    let mut meal = Meal::new(MEAL_NAME);
    for (name, qty) in servings {
        if qty > 0.0 {
            if let Some(food) = catalog.get(name) {
                meal.add(food, qty);
            }
        }
    }
    Ok((meal, missing))
}

fn run_day(args: &DayArguments, settings: &Settings) -> ServiceResult<String> {
    let catalog = settings.catalog()?;
    let log = settings.daily_log();
    let mut out = String::new();

    let loaded = match args.load {
        Some(date) => {
            let Some(row) = log.load_by_date(date)? else {
                return Err(ServiceError::InvalidArgument(missing_day_message(
                    date,
                    &log.dates()?,
                )));
            };
            Some(row.foods)
        }
        None => None,
    };
    let (meal, missing) = build_meal(&catalog, loaded.as_deref(), &args.foods)?;
    if !missing.is_empty() {
        let _ = writeln!(
            out,
            "{} {}",
            "Missing foods not found in your library:".yellow(),
            missing.join(", ")
        );
    }

    let profile = settings.profile_store().load()?;
    let balance = EnergyBalance::compute(&profile, &args.workouts);
    let totals = meal.totals();
    let calories = meal.calories();

    let dashboard = Dashboard::new(
        totals,
        calories,
        balance.burned_kcal,
        balance.burned_error_kcal,
        &settings.targets,
    );
    let _ = writeln!(out, "{}", meal.name.bold().underline());
    out.push_str(&dashboard.render());
    out.push('\n');
    out.push_str(&totals_table(&totals, calories, balance.burned_kcal));

    if args.save {
        let row = LogRow::for_day(
            Local::now().naive_local().trunc_subsecs(0),
            &meal,
            &balance,
            profile.weight_kg,
        );
        let replaced = log.append_or_replace(&row)?;
        let verb = if replaced { "Updated" } else { "Saved" };
        let _ = write!(out, "\n{} {}", verb.green().bold(), log.path().display());
    }
    Ok(out)
}

/// Most recent saved dates offered when `--load` names a day with no entry.
const SUGGESTED_DATES: usize = 5;

fn missing_day_message(date: NaiveDate, saved: &[NaiveDate]) -> String {
    if saved.is_empty() {
        return format!("No log entry for {date}; no days have been saved yet");
    }
    let recent: Vec<String> = saved
        .iter()
        .take(SUGGESTED_DATES)
        .map(|d| d.to_string())
        .collect();
    format!("No log entry for {date}; saved days include {}", recent.join(", "))
}

fn run_days(settings: &Settings) -> ServiceResult<String> {
    let log = settings.daily_log();
    let dates = log.dates()?;
    if dates.is_empty() {
        return Ok("No saved days yet. Save one with `day --save`.".to_string());
    }
    let mut out = String::new();
    for date in dates {
        let _ = writeln!(out, "{date}");
    }
    Ok(out)
}

fn metric_value(row: &LogRow, metric: TrendMetric) -> f64 {
    match metric {
        TrendMetric::Calories => row.intake_kcal,
        TrendMetric::Burned => row.burned_kcal,
        TrendMetric::Net => row.net_kcal,
        TrendMetric::Protein => row.protein_g,
        TrendMetric::Fat => row.fat_g,
        TrendMetric::Carbs => row.carb_g,
    }
}

fn metric_label(metric: TrendMetric) -> &'static str {
    match metric {
        TrendMetric::Calories => "kcal",
        TrendMetric::Burned => "burned",
        TrendMetric::Net => "net",
        TrendMetric::Protein => "protein_g",
        TrendMetric::Fat => "fat_g",
        TrendMetric::Carbs => "carb_g",
    }
}

pub fn trends_table(mut rows: Vec<LogRow>, metrics: &[TrendMetric]) -> String {
    rows.sort_by_key(|row| row.timestamp);
    let metrics: Vec<TrendMetric> = if metrics.is_empty() {
        TrendMetric::value_variants().to_vec()
    } else {
        metrics.to_vec()
    };

    let mut out = format!("{:<10}", "date");
    for metric in &metrics {
        let _ = write!(out, " {:>10}", metric_label(*metric));
    }
    out.push('\n');
    for row in &rows {
        let _ = write!(out, "{:<10}", row.date().format("%Y-%m-%d"));
        for metric in &metrics {
            let _ = write!(out, " {:>10.0}", metric_value(row, *metric));
        }
        out.push('\n');
    }
    out
}

fn run_trends(args: &TrendsArguments, settings: &Settings) -> ServiceResult<String> {
    let rows = settings.daily_log().read_all()?;
    if rows.is_empty() {
        return Ok("No saved days yet. Save one with `day --save`.".to_string());
    }
    Ok(trends_table(rows, &args.metrics))
}

fn prompt_number(theme: &ColorfulTheme, label: &str, current: f64) -> ServiceResult<f64> {
    let value = Input::<f64>::with_theme(theme)
        .with_prompt(label)
        .default(current)
        .validate_with(|v: &f64| {
            if v.is_finite() && *v >= 0.0 {
                Ok(())
            } else {
                Err("must be a non-negative number")
            }
        })
        .interact_text()?;
    Ok(value)
}

fn run_config(settings: &mut Settings) -> ServiceResult<String> {
    let theme = ColorfulTheme::default();
    let t = settings.targets.clone();
    let [low, ok, high] = t.calorie_bands_kcal;
    let edited = Targets {
        protein_pct: prompt_number(&theme, "Protein target (% of kcal)", t.protein_pct)?,
        fat_pct: prompt_number(&theme, "Fat target (% of kcal)", t.fat_pct)?,
        carb_pct: prompt_number(&theme, "Carb target (% of kcal)", t.carb_pct)?,
        calories_kcal: prompt_number(&theme, "Calorie target (kcal)", t.calories_kcal)?,
        calorie_scale_kcal: prompt_number(
            &theme,
            "Calorie bar scale (kcal)",
            t.calorie_scale_kcal,
        )?,
        calorie_bands_kcal: [
            prompt_number(&theme, "Low band starts at (kcal)", low)?,
            prompt_number(&theme, "On-target band starts at (kcal)", ok)?,
            prompt_number(&theme, "Over band starts at (kcal)", high)?,
        ],
        sodium_mg: prompt_number(&theme, "Sodium limit (mg)", t.sodium_mg)?,
        fiber_g: prompt_number(&theme, "Fiber goal (g)", t.fiber_g)?,
        added_sugar_g: prompt_number(&theme, "Added sugar limit (g)", t.added_sugar_g)?,
        potassium_mg: prompt_number(&theme, "Potassium goal (mg)", t.potassium_mg)?,
    };
    edited.validate().map_err(ServiceError::InvalidArgument)?;

    settings.targets = edited;
    settings.save_targets()?;
    Ok("Targets saved".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::DailyLog;
    use crate::types::Sex;

    fn settings() -> (tempfile::TempDir, Settings) {
        colored::control::set_override(false);
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(Some(dir.path().to_path_buf())).unwrap();
        (dir, settings)
    }

    fn seed(settings: &Settings) -> FoodCatalog {
        let mut catalog = settings.catalog().unwrap();
        add_food(
            &mut catalog,
            "banana",
            Nutrients {
                protein_g: 1.0,
                carb_g: 27.0,
                ..Default::default()
            },
        )
        .unwrap();
        add_food(
            &mut catalog,
            "egg",
            Nutrients {
                protein_g: 6.0,
                fat_g: 5.0,
                carb_g: 0.6,
                sodium_mg: 70.0,
                potassium_mg: 70.0,
                ..Default::default()
            },
        )
        .unwrap();
        catalog
    }

    fn item(name: &str, servings: f64) -> MealItem {
        MealItem {
            name: name.to_string(),
            servings,
        }
    }

    #[test]
    fn add_rejects_blank_and_duplicate_names() {
        let (_dir, settings) = settings();
        let mut catalog = seed(&settings);
        assert!(matches!(
            add_food(&mut catalog, "   ", Nutrients::default()),
            Err(ServiceError::InvalidFoodName)
        ));
        assert!(matches!(
            add_food(&mut catalog, " banana ", Nutrients::default()),
            Err(ServiceError::DuplicateFood(name)) if name == "banana"
        ));
        assert_eq!(catalog.foods().len(), 2);
    }

    #[test]
    fn edit_requires_an_existing_food_and_persists() {
        let (_dir, settings) = settings();
        let mut catalog = seed(&settings);
        let changes = NutrientArguments {
            fiber: Some(3.0),
            ..Default::default()
        };
        assert!(matches!(
            edit_food(&mut catalog, "kiwi", &changes),
            Err(ServiceError::FoodNotFound(_))
        ));

        edit_food(&mut catalog, "banana", &changes).unwrap();
        let reloaded = settings.catalog().unwrap();
        let banana = reloaded.get("banana").unwrap();
        assert_eq!(banana.nutrients.fiber_g, 3.0);
        assert_eq!(banana.nutrients.carb_g, 27.0);
    }

    #[test]
    fn negative_or_non_finite_amounts_are_rejected() {
        let (_dir, settings) = settings();
        let mut catalog = seed(&settings);
        let bad = Nutrients {
            fat_g: -5.0,
            ..Default::default()
        };
        assert!(matches!(
            add_food(&mut catalog, "bad", bad),
            Err(ServiceError::InvalidArgument(_))
        ));
        assert!(!catalog.contains("bad"));

        let changes = NutrientArguments {
            sodium: Some(f64::NAN),
            ..Default::default()
        };
        assert!(matches!(
            edit_food(&mut catalog, "egg", &changes),
            Err(ServiceError::InvalidArgument(_))
        ));
        assert_eq!(catalog.get("egg").unwrap().nutrients.sodium_mg, 70.0);

        let reloaded = settings.catalog().unwrap();
        assert_eq!(reloaded.foods(), catalog.foods());
    }

    #[test]
    fn delete_persists_removals() {
        let (_dir, settings) = settings();
        let mut catalog = seed(&settings);
        let removed =
            delete_foods(&mut catalog, &["egg".to_string(), "kiwi".to_string()]).unwrap();
        assert_eq!(removed, vec!["egg".to_string()]);
        assert!(!settings.catalog().unwrap().contains("egg"));
    }

    #[test]
    fn meal_skips_zero_servings_and_unknown_foods_fail() {
        let (_dir, settings) = settings();
        let catalog = seed(&settings);
        let (meal, missing) =
            build_meal(&catalog, None, &[item("banana", 2.0), item("egg", 0.0)]).unwrap();
        assert!(missing.is_empty());
        assert_eq!(meal.lines().len(), 1);
        assert_eq!(meal.calories(), 224.0);

        assert!(matches!(
            build_meal(&catalog, None, &[item("kiwi", 1.0)]),
            Err(ServiceError::FoodNotFound(_))
        ));
    }

    #[test]
    fn loaded_foods_are_overridden_by_explicit_items() {
        let (_dir, settings) = settings();
        let catalog = seed(&settings);
        let (meal, missing) = build_meal(
            &catalog,
            Some("eggx2; ghostx1; bananax1"),
            &[item("banana", 3.0)],
        )
        .unwrap();
        assert_eq!(missing, vec!["ghost".to_string()]);
        let lines: Vec<(&str, f64)> = meal
            .lines()
            .iter()
            .map(|l| (l.food.name.as_str(), l.servings))
            .collect();
        assert_eq!(lines, vec![("egg", 2.0), ("banana", 3.0)]);
    }

    #[test]
    fn day_save_then_update() {
        let (_dir, settings) = settings();
        seed(&settings);
        settings
            .profile_store()
            .save(&UserProfile {
                sex: Sex::Female,
                age_years: 25.0,
                height_cm: 165.0,
                weight_kg: 60.0,
            })
            .unwrap();

        let args = DayArguments {
            foods: vec![item("banana", 2.0)],
            save: true,
            ..Default::default()
        };
        let first = run_day(&args, &settings).unwrap();
        assert!(first.contains("Saved"));
        assert!(first.contains("1614 kcal"));

        let second = run_day(&args, &settings).unwrap();
        assert!(second.contains("Updated"));

        let rows = settings.daily_log().read_all().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].intake_kcal, 224.0);
        assert_eq!(rows[0].foods, "bananax2");
        assert_eq!(rows[0].weight_kg, Some(60.0));
        assert_eq!(rows[0].burned_error_kcal, None);
    }

    #[test]
    fn day_without_save_leaves_log_empty() {
        let (_dir, settings) = settings();
        seed(&settings);
        let args = DayArguments {
            foods: vec![item("egg", 1.0)],
            ..Default::default()
        };
        let out = run_day(&args, &settings).unwrap();
        assert!(!out.contains("Saved"));
        assert!(settings.daily_log().read_all().unwrap().is_empty());
    }

    #[test]
    fn loading_an_unsaved_date_is_reported() {
        let (_dir, settings) = settings();
        let args = DayArguments {
            load: NaiveDate::from_ymd_opt(2024, 1, 1),
            ..Default::default()
        };
        assert!(matches!(
            run_day(&args, &settings),
            Err(ServiceError::InvalidArgument(msg)) if msg.contains("no days have been saved")
        ));
    }

    #[test]
    fn missing_day_suggests_saved_dates() {
        let (_dir, settings) = settings();
        seed(&settings);
        let log = settings.daily_log();
        let balance = EnergyBalance::compute(&UserProfile::default(), &[]);
        for day in [1, 2] {
            let ts = NaiveDate::from_ymd_opt(2024, 1, day)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap();
            log.append_or_replace(&LogRow::for_day(ts, &Meal::new(MEAL_NAME), &balance, 0.0))
                .unwrap();
        }

        let args = DayArguments {
            load: NaiveDate::from_ymd_opt(2024, 1, 5),
            ..Default::default()
        };
        let Err(ServiceError::InvalidArgument(msg)) = run_day(&args, &settings) else {
            panic!("expected a missing-day error");
        };
        assert!(msg.ends_with("saved days include 2024-01-02, 2024-01-01"));

        assert_eq!(run_days(&settings).unwrap(), "2024-01-02\n2024-01-01\n");
    }

    #[test]
    fn days_listing_when_nothing_saved() {
        let (_dir, settings) = settings();
        assert!(run_days(&settings).unwrap().starts_with("No saved days yet"));
    }

    #[test]
    fn trends_are_sorted_by_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let log = DailyLog::new(dir.path().join("macro_log.csv"));
        let catalog_food = crate::types::FoodProfile::new("egg", Nutrients::default());
        let mut meal = Meal::new(MEAL_NAME);
        meal.add(&catalog_food, 1.0);
        let balance = EnergyBalance::compute(&UserProfile::default(), &[]);
        for day in [3, 1, 2] {
            let ts = NaiveDate::from_ymd_opt(2024, 1, day)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap();
            log.append_or_replace(&LogRow::for_day(ts, &meal, &balance, 0.0))
                .unwrap();
        }

        let table = trends_table(log.read_all().unwrap(), &[TrendMetric::Calories]);
        let dates: Vec<&str> = table
            .lines()
            .skip(1)
            .map(|l| l.split_whitespace().next().unwrap())
            .collect();
        assert_eq!(dates, vec!["2024-01-01", "2024-01-02", "2024-01-03"]);
        assert!(table.lines().next().unwrap().contains("kcal"));
        assert!(!table.contains("protein_g"));
    }

    #[test]
    fn profile_set_reports_base_burn() {
        let (_dir, settings) = settings();
        let out = run_profile(
            ProfileCommand::Set {
                sex: Some(Sex::Male),
                age: Some(30.0),
                height_cm: Some(175.0),
                weight_kg: Some(70.0),
            },
            &settings,
        )
        .unwrap();
        assert!(out.starts_with("Profile saved"));
        assert!(out.contains("BMR: 1649 kcal"));
    }
}
