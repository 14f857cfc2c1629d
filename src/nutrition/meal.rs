use crate::types::{FoodProfile, Nutrient, NutrientTotals};

/// Denominator used for macro percentages when a meal has no energy.
pub const CALORIE_EPSILON: f64 = 1e-6;

#[derive(Clone, Debug, PartialEq)]
pub struct MealLine<'a> {
    pub food: &'a FoodProfile,
    pub servings: f64,
}

/// Ordered servings of catalog foods. Order only matters for the stored
/// foods descriptor; totals are plain sums.
#[derive(Clone, Debug, PartialEq)]
pub struct Meal<'a> {
    pub name: String,
    lines: Vec<MealLine<'a>>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MacroSplit {
    pub protein_pct: f64,
    pub fat_pct: f64,
    pub carb_pct: f64,
}

impl MacroSplit {
    pub fn get(&self, nutrient: Nutrient) -> Option<f64> {
        match nutrient {
            Nutrient::Protein => Some(self.protein_pct),
            Nutrient::Fat => Some(self.fat_pct),
            Nutrient::Carb => Some(self.carb_pct),
            _ => None,
        }
    }
}

impl<'a> Meal<'a> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lines: Vec::new(),
        }
    }

    /// Appends a line. Zero servings are accepted and contribute nothing.
    pub fn add(&mut self, food: &'a FoodProfile, servings: f64) {
        self.lines.push(MealLine { food, servings });
    }

    pub fn lines(&self) -> &[MealLine<'a>] {
        &self.lines
    }

    pub fn totals(&self) -> NutrientTotals {
        self.lines
            .iter()
            .map(|line| line.food.nutrients * line.servings)
            .sum()
    }

    pub fn calories(&self) -> f64 {
        self.totals().calories()
    }
}

/// Gross carbohydrate minus fiber. Not clamped.
pub fn net_carbs(totals: &NutrientTotals) -> f64 {
    totals.carb_g - totals.fiber_g
}

/// Share of total energy from each macronutrient, in percent.
pub fn macro_split(totals: &NutrientTotals, total_calories: f64) -> MacroSplit {
    let denominator = if total_calories == 0.0 {
        CALORIE_EPSILON
    } else {
        total_calories
    };
    let pct = |nutrient: Nutrient| {
        let factor = nutrient.kcal_per_gram().unwrap_or(0.0);
        totals.get(nutrient) * factor / denominator * 100.0
    };
    MacroSplit {
        protein_pct: pct(Nutrient::Protein),
        fat_pct: pct(Nutrient::Fat),
        carb_pct: pct(Nutrient::Carb),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Nutrients;

    fn food(name: &str, protein: f64, fat: f64, carb: f64) -> FoodProfile {
        FoodProfile::new(
            name,
            Nutrients {
                protein_g: protein,
                fat_g: fat,
                carb_g: carb,
                ..Default::default()
            },
        )
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn banana_scenario() {
        let banana = food("banana", 1.0, 0.0, 27.0);
        let mut meal = Meal::new("Today's Intake");
        meal.add(&banana, 2.0);

        let totals = meal.totals();
        assert_eq!(totals.protein_g, 2.0);
        assert_eq!(totals.fat_g, 0.0);
        assert_eq!(totals.carb_g, 54.0);
        assert_eq!(totals.fiber_g, 0.0);
        assert_eq!(meal.calories(), 224.0);
    }

    #[test]
    fn totals_are_elementwise_sums() {
        let apple = food("apple", 0.3, 0.2, 10.0);
        let mut egg = food("egg", 6.0, 5.0, 0.6);
        egg.nutrients.sodium_mg = 70.0;
        egg.nutrients.potassium_mg = 70.0;

        let mut meal = Meal::new("Meal");
        meal.add(&apple, 1.0);
        meal.add(&egg, 2.0);

        let totals = meal.totals();
        assert!(close(totals.protein_g, 0.3 + 12.0));
        assert!(close(totals.fat_g, 0.2 + 10.0));
        assert!(close(totals.carb_g, 10.0 + 1.2));
        assert!(close(totals.sodium_mg, 140.0));
        assert!(close(totals.potassium_mg, 140.0));
    }

    #[test]
    fn zero_serving_lines_do_not_change_totals() {
        let egg = food("egg", 6.0, 5.0, 0.6);
        let guac = food("guac", 1.0, 10.0, 5.0);
        let mut meal = Meal::new("Meal");
        meal.add(&egg, 2.0);
        let before = meal.totals();

        meal.add(&guac, 0.0);
        assert_eq!(meal.totals(), before);
        assert_eq!(meal.lines().len(), 2);
    }

    #[test]
    fn calories_match_macro_formula() {
        let egg = food("egg", 6.0, 5.0, 0.6);
        let whey = food("whey", 30.0, 4.0, 8.0);
        let mut meal = Meal::new("Meal");
        meal.add(&egg, 4.0);
        meal.add(&whey, 1.5);

        let t = meal.totals();
        assert_eq!(meal.calories(), t.protein_g * 4.0 + t.fat_g * 9.0 + t.carb_g * 4.0);
    }

    #[test]
    fn insertion_order_is_kept() {
        let a = food("a", 1.0, 0.0, 0.0);
        let b = food("b", 0.0, 1.0, 0.0);
        let mut meal = Meal::new("Meal");
        meal.add(&b, 1.0);
        meal.add(&a, 3.0);
        let names: Vec<&str> = meal.lines().iter().map(|l| l.food.name.as_str()).collect();
        assert_eq!(names, ["b", "a"]);
    }

    #[test]
    fn net_carbs_can_go_negative() {
        let totals = Nutrients {
            carb_g: 5.0,
            fiber_g: 8.0,
            ..Default::default()
        };
        assert_eq!(net_carbs(&totals), -3.0);
    }

    #[test]
    fn macro_split_sums_to_hundred() {
        let egg = food("egg", 6.0, 5.0, 0.6);
        let mut meal = Meal::new("Meal");
        meal.add(&egg, 2.0);
        let totals = meal.totals();
        let split = macro_split(&totals, meal.calories());
        assert!(close(split.protein_pct + split.fat_pct + split.carb_pct, 100.0));
        assert!(close(split.fat_pct, 90.0 / meal.calories() * 100.0));
    }

    #[test]
    fn macro_split_of_empty_meal_is_zero() {
        let meal = Meal::new("Meal");
        let split = macro_split(&meal.totals(), meal.calories());
        assert_eq!(split.protein_pct, 0.0);
        assert_eq!(split.fat_pct, 0.0);
        assert_eq!(split.carb_pct, 0.0);
        assert!(split.get(Nutrient::Sodium).is_none());
    }
}
