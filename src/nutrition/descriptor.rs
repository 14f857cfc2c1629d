//! The `foods` column of the daily log: `name x servings` pairs written as
//! `"{name}x{servings}"` and joined with `"; "`.
//!
//! Decoding splits each token on its last `x`, so a name is safe as long as
//! the quantity after it never contains an `x`. Tokens whose quantity does
//! not parse are dropped on their own.

use std::collections::BTreeMap;

use super::meal::Meal;
use crate::types::FoodProfile;

pub const LINE_SEPARATOR: &str = "; ";
pub const QUANTITY_MARKER: char = 'x';

pub fn encode(meal: &Meal<'_>) -> String {
    meal.lines()
        .iter()
        .map(|line| format!("{}{}{}", line.food.name, QUANTITY_MARKER, line.servings))
        .collect::<Vec<_>>()
        .join(LINE_SEPARATOR)
}

/// Returns `(name, servings)` pairs in first-seen order. A repeated name
/// keeps its last quantity.
pub fn decode(descriptor: &str) -> Vec<(String, f64)> {
    let mut parsed: Vec<(String, f64)> = Vec::new();
    for token in descriptor.split(LINE_SEPARATOR) {
        if token.is_empty() {
            continue;
        }
        let Some((name, qty)) = token.rsplit_once(QUANTITY_MARKER) else {
            tracing::debug!(token, "foods token without quantity, skipping");
            continue;
        };
        let servings = match qty.trim().parse::<f64>() {
            Ok(v) if v.is_finite() && v >= 0.0 => v,
            _ => {
                tracing::debug!(token, "unparseable foods token, skipping");
                continue;
            }
        };
        match parsed.iter_mut().find(|(existing, _)| existing == name) {
            Some(entry) => entry.1 = servings,
            None => parsed.push((name.to_string(), servings)),
        }
    }
    parsed
}

/// Rebuilds a meal from a stored descriptor. Foods no longer in the catalog
/// are returned by name instead of failing the load.
pub fn restore_meal<'a>(
    name: impl Into<String>,
    descriptor: &str,
    foods: &'a BTreeMap<String, FoodProfile>,
) -> (Meal<'a>, Vec<String>) {
    let mut meal = Meal::new(name);
    let mut missing = Vec::new();
    for (food_name, servings) in decode(descriptor) {
        match foods.get(&food_name) {
            Some(food) if servings > 0.0 => meal.add(food, servings),
            Some(_) => {}
            None => missing.push(food_name),
        }
    }
    missing.sort();
    (meal, missing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Nutrients;

    #[test]
    fn encodes_in_meal_order() {
        let egg = FoodProfile::new("egg", Nutrients::default());
        let rice = FoodProfile::new("rice½", Nutrients::default());
        let mut meal = Meal::new("Meal");
        meal.add(&egg, 2.0);
        meal.add(&rice, 0.5);
        assert_eq!(encode(&meal), "eggx2; rice½x0.5");
    }

    #[test]
    fn empty_meal_encodes_to_empty_string() {
        assert_eq!(encode(&Meal::new("Meal")), "");
        assert!(decode("").is_empty());
    }

    #[test]
    fn splits_on_last_marker() {
        let decoded = decode("box of raisinsx1.5; Ernies #9x1");
        assert_eq!(
            decoded,
            vec![
                ("box of raisins".to_string(), 1.5),
                ("Ernies #9".to_string(), 1.0)
            ]
        );
    }

    #[test]
    fn reads_values_written_with_trailing_zero() {
        assert_eq!(decode("eggx2.0"), vec![("egg".to_string(), 2.0)]);
    }

    #[test]
    fn drops_only_the_bad_tokens() {
        let decoded = decode("eggx2; guacxlots; plain; tunax-1; beansx0.25");
        assert_eq!(
            decoded,
            vec![("egg".to_string(), 2.0), ("beans".to_string(), 0.25)]
        );
    }

    #[test]
    fn repeated_names_keep_last_quantity() {
        let decoded = decode("eggx1; tunax1; eggx3");
        assert_eq!(
            decoded,
            vec![("egg".to_string(), 3.0), ("tuna".to_string(), 1.0)]
        );
    }

    #[test]
    fn restores_known_foods_and_reports_missing() {
        let mut foods = BTreeMap::new();
        foods.insert(
            "egg".to_string(),
            FoodProfile::new(
                "egg",
                Nutrients {
                    protein_g: 6.0,
                    fat_g: 5.0,
                    carb_g: 0.6,
                    ..Default::default()
                },
            ),
        );
        let (meal, missing) = restore_meal("Meal", "eggx2; unicorn stewx1; eggx3", &foods);
        assert_eq!(missing, vec!["unicorn stew".to_string()]);
        assert_eq!(meal.lines().len(), 1);
        assert_eq!(meal.lines()[0].servings, 3.0);
        assert_eq!(meal.totals().protein_g, 18.0);
    }

    #[test]
    fn round_trips_a_meal() {
        let egg = FoodProfile::new("egg", Nutrients::default());
        let matcha = FoodProfile::new("iced_matcha", Nutrients::default());
        let mut meal = Meal::new("Meal");
        meal.add(&egg, 4.0);
        meal.add(&matcha, 1.25);
        assert_eq!(
            decode(&encode(&meal)),
            vec![("egg".to_string(), 4.0), ("iced_matcha".to_string(), 1.25)]
        );
    }
}
