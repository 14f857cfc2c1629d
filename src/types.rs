use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Nutrient {
    Protein,
    Fat,
    Carb,
    Fiber,
    AddedSugar,
    Sodium,
    Potassium,
}

impl Nutrient {
    pub const ALL: [Nutrient; 7] = [
        Nutrient::Protein,
        Nutrient::Fat,
        Nutrient::Carb,
        Nutrient::Fiber,
        Nutrient::AddedSugar,
        Nutrient::Sodium,
        Nutrient::Potassium,
    ];

    /// Key used in the persisted catalog.
    pub fn as_str(&self) -> &'static str {
        match self {
            Nutrient::Protein => "protein",
            Nutrient::Fat => "fat",
            Nutrient::Carb => "carb",
            Nutrient::Fiber => "fiber",
            Nutrient::AddedSugar => "add_sugar",
            Nutrient::Sodium => "sodium",
            Nutrient::Potassium => "potassium",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Nutrient::Protein => "Protein",
            Nutrient::Fat => "Fat",
            Nutrient::Carb => "Carbs",
            Nutrient::Fiber => "Fiber",
            Nutrient::AddedSugar => "Added sugar",
            Nutrient::Sodium => "Sodium",
            Nutrient::Potassium => "Potassium",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Nutrient::Sodium | Nutrient::Potassium => "mg",
            _ => "g",
        }
    }

    /// Atwater factor, for the nutrients that contribute energy.
    pub fn kcal_per_gram(&self) -> Option<f64> {
        match self {
            Nutrient::Protein | Nutrient::Carb => Some(4.0),
            Nutrient::Fat => Some(9.0),
            _ => None,
        }
    }
}

impl fmt::Display for Nutrient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_zero(value: &f64) -> bool {
    *value == 0.0
}

/// Reads a stored amount, treating anything that is not a finite,
/// non-negative number as 0.
fn lenient_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    let parsed = match &raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Null => Some(0.0),
        _ => None,
    }
    .filter(|v| v.is_finite() && *v >= 0.0);

    match parsed {
        Some(v) => Ok(v),
        None => {
            tracing::warn!(value = %raw, "malformed amount, defaulting to 0");
            Ok(0.0)
        }
    }
}

/// Amounts of the seven tracked nutrients. Used both for a food's
/// per-serving profile and for meal totals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrients {
    #[serde(
        rename = "protein",
        default,
        deserialize_with = "lenient_amount",
        skip_serializing_if = "is_zero"
    )]
    pub protein_g: f64,
    #[serde(
        rename = "fat",
        default,
        deserialize_with = "lenient_amount",
        skip_serializing_if = "is_zero"
    )]
    pub fat_g: f64,
    #[serde(
        rename = "carb",
        default,
        deserialize_with = "lenient_amount",
        skip_serializing_if = "is_zero"
    )]
    pub carb_g: f64,
    #[serde(
        rename = "fiber",
        default,
        deserialize_with = "lenient_amount",
        skip_serializing_if = "is_zero"
    )]
    pub fiber_g: f64,
    #[serde(
        rename = "add_sugar",
        default,
        deserialize_with = "lenient_amount",
        skip_serializing_if = "is_zero"
    )]
    pub added_sugar_g: f64,
    #[serde(
        rename = "sodium",
        default,
        deserialize_with = "lenient_amount",
        skip_serializing_if = "is_zero"
    )]
    pub sodium_mg: f64,
    #[serde(
        rename = "potassium",
        default,
        deserialize_with = "lenient_amount",
        skip_serializing_if = "is_zero"
    )]
    pub potassium_mg: f64,
}

pub type NutrientTotals = Nutrients;

impl Nutrients {
    pub fn get(&self, nutrient: Nutrient) -> f64 {
        match nutrient {
            Nutrient::Protein => self.protein_g,
            Nutrient::Fat => self.fat_g,
            Nutrient::Carb => self.carb_g,
            Nutrient::Fiber => self.fiber_g,
            Nutrient::AddedSugar => self.added_sugar_g,
            Nutrient::Sodium => self.sodium_mg,
            Nutrient::Potassium => self.potassium_mg,
        }
    }

    pub fn set(&mut self, nutrient: Nutrient, value: f64) {
        let slot = match nutrient {
            Nutrient::Protein => &mut self.protein_g,
            Nutrient::Fat => &mut self.fat_g,
            Nutrient::Carb => &mut self.carb_g,
            Nutrient::Fiber => &mut self.fiber_g,
            Nutrient::AddedSugar => &mut self.added_sugar_g,
            Nutrient::Sodium => &mut self.sodium_mg,
            Nutrient::Potassium => &mut self.potassium_mg,
        };
        *slot = value;
    }

    pub fn scale(&self, servings: f64) -> Self {
        let mut out = Self::default();
        for nutrient in Nutrient::ALL {
            out.set(nutrient, self.get(nutrient) * servings);
        }
        out
    }

    /// Atwater energy: protein and carb at 4 kcal/g, fat at 9 kcal/g.
    pub fn calories(&self) -> f64 {
        self.protein_g * 4.0 + self.fat_g * 9.0 + self.carb_g * 4.0
    }

    /// Every amount is finite and not negative.
    pub fn is_non_negative(&self) -> bool {
        Nutrient::ALL
            .iter()
            .all(|n| self.get(*n).is_finite() && self.get(*n) >= 0.0)
    }
}

impl AddAssign for Nutrients {
    fn add_assign(&mut self, other: Nutrients) {
        for nutrient in Nutrient::ALL {
            self.set(nutrient, self.get(nutrient) + other.get(nutrient));
        }
    }
}

impl Add for Nutrients {
    type Output = Nutrients;

    fn add(mut self, other: Nutrients) -> Nutrients {
        self += other;
        self
    }
}

impl Mul<f64> for Nutrients {
    type Output = Nutrients;

    fn mul(self, servings: f64) -> Nutrients {
        self.scale(servings)
    }
}

impl Sum for Nutrients {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Nutrients::default(), |acc, n| acc + n)
    }
}

/// A named food with its per-serving nutrient profile. Edits replace the
/// whole value under the same name.
#[derive(Clone, Debug, PartialEq)]
pub struct FoodProfile {
    pub name: String,
    pub nutrients: Nutrients,
}

impl FoodProfile {
    pub fn new(name: impl Into<String>, nutrients: Nutrients) -> Self {
        Self {
            name: name.into(),
            nutrients,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(from = "String", into = "String")]
pub enum Sex {
    #[default]
    Unspecified,
    Female,
    Male,
}

impl Sex {
    /// Stored form; unspecified persists as an empty string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Unspecified => "",
            Sex::Female => "Female",
            Sex::Male => "Male",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sex::Unspecified => f.write_str("unspecified"),
            other => f.write_str(other.as_str()),
        }
    }
}

impl From<String> for Sex {
    fn from(s: String) -> Self {
        match s.trim() {
            "Female" => Sex::Female,
            "Male" => Sex::Male,
            _ => Sex::Unspecified,
        }
    }
}

impl From<Sex> for String {
    fn from(sex: Sex) -> Self {
        sex.as_str().to_string()
    }
}

/// Persisted body profile. All-zero/unspecified means "not filled in yet".
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    pub sex: Sex,
    #[serde(rename = "age", deserialize_with = "lenient_amount")]
    pub age_years: f64,
    #[serde(deserialize_with = "lenient_amount")]
    pub height_cm: f64,
    #[serde(deserialize_with = "lenient_amount")]
    pub weight_kg: f64,
}
