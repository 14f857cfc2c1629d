//! Energy expenditure estimates.
//!
//! Resting burn uses the Mifflin-St Jeor equation (Mifflin et al., 1990):
//! `10 x weight_kg + 6.25 x height_cm - 5 x age + offset`, where the offset is
//! +5 for men and -161 for women. Daily burn is the sedentary TDEE
//! (BMR x 1.2) plus any workout adjustments the user logs.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::types::{Sex, UserProfile};

pub const SEDENTARY_ACTIVITY_FACTOR: f64 = 1.2;

const MSJ_WEIGHT_COEF: f64 = 10.0;
const MSJ_HEIGHT_COEF: f64 = 6.25;
const MSJ_AGE_COEF: f64 = 5.0;
const MSJ_MALE_CONSTANT: f64 = 5.0;
const MSJ_FEMALE_CONSTANT: f64 = -161.0;

/// A user-entered calorie adjustment. Negative calories correct an
/// overestimate or record a rest day.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkoutEntry {
    pub label: String,
    pub calories: f64,
    pub error_kcal: f64,
}

impl WorkoutEntry {
    pub fn new(label: impl Into<String>, calories: f64, error_kcal: f64) -> Self {
        Self {
            label: label.into(),
            calories,
            error_kcal,
        }
    }
}

fn parse_kcal(raw: &str, input: &str) -> Result<f64, String> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("Invalid calories '{raw}' in workout '{input}'"))
}

/// Parses `LABEL:KCAL` or `LABEL:KCAL:ERROR`.
impl FromStr for WorkoutEntry {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (head, last) = s
            .rsplit_once(':')
            .ok_or_else(|| format!("Expected LABEL:KCAL[:ERROR], got '{s}'"))?;
        let last = parse_kcal(last, s)?;

        let with_error = head
            .rsplit_once(':')
            .and_then(|(label, kcal)| kcal.trim().parse::<f64>().ok().map(|k| (label, k)))
            .filter(|(_, k)| k.is_finite());

        let entry = match with_error {
            Some((label, calories)) => WorkoutEntry::new(label.trim(), calories, last),
            None => WorkoutEntry::new(head.trim(), last, 0.0),
        };
        if entry.label.is_empty() {
            return Err(format!("Workout label missing in '{s}'"));
        }
        Ok(entry)
    }
}

fn is_unset(value: f64) -> bool {
    !(value.is_finite() && value > 0.0)
}

/// Basal metabolic rate in kcal/day. A partially filled profile yields 0.
pub fn bmr(sex: Sex, weight_kg: f64, height_cm: f64, age_years: f64) -> f64 {
    if sex == Sex::Unspecified || is_unset(weight_kg) || is_unset(height_cm) || is_unset(age_years)
    {
        return 0.0;
    }

    let base =
        MSJ_WEIGHT_COEF * weight_kg + MSJ_HEIGHT_COEF * height_cm - MSJ_AGE_COEF * age_years;
    let offset = match sex {
        Sex::Male => MSJ_MALE_CONSTANT,
        Sex::Female => MSJ_FEMALE_CONSTANT,
        Sex::Unspecified => 0.0,
    };
    (base + offset).max(0.0)
}

pub fn sedentary_tdee(bmr: f64) -> f64 {
    bmr * SEDENTARY_ACTIVITY_FACTOR
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EnergyBalance {
    pub bmr: f64,
    pub base_burn_kcal: f64,
    pub workout_adjust_kcal: f64,
    pub burned_kcal: f64,
    /// `None` when no workouts were logged; `Some(0.0)` when workouts were
    /// logged without any error estimate.
    pub burned_error_kcal: Option<f64>,
}

impl EnergyBalance {
    pub fn compute(profile: &UserProfile, workouts: &[WorkoutEntry]) -> Self {
        let bmr = bmr(
            profile.sex,
            profile.weight_kg,
            profile.height_cm,
            profile.age_years,
        );
        let base_burn_kcal = sedentary_tdee(bmr);
        let workout_adjust_kcal: f64 = workouts.iter().map(|w| w.calories).sum();
        let burned_error_kcal = if workouts.is_empty() {
            None
        } else {
            Some(workouts.iter().map(|w| w.error_kcal.abs()).sum())
        };

        Self {
            bmr,
            base_burn_kcal,
            workout_adjust_kcal,
            burned_kcal: (base_burn_kcal + workout_adjust_kcal).max(0.0),
            burned_error_kcal,
        }
    }

    pub fn net_kcal(&self, intake_kcal: f64) -> f64 {
        intake_kcal - self.burned_kcal
    }
}
