use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ServiceError, ServiceResult};
use crate::metadata::DEFAULT_DATA_DIR;
use crate::storage::{DailyLog, FoodCatalog, ProfileStore, read_optional, write_atomic};

pub const FOODS_FILE: &str = "foods.json";
pub const LOG_FILE: &str = "macro_log.csv";
pub const PROFILE_FILE: &str = "profile.json";
pub const SETTINGS_FILE: &str = "settings.json";

/// Dashboard goals. Percentages are shares of total calories.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Targets {
    pub protein_pct: f64,
    pub fat_pct: f64,
    pub carb_pct: f64,
    pub calories_kcal: f64,
    pub calorie_scale_kcal: f64,
    /// Lower edges of the low / on-target / over bands on the calorie bar.
    pub calorie_bands_kcal: [f64; 3],
    pub sodium_mg: f64,
    pub fiber_g: f64,
    pub added_sugar_g: f64,
    pub potassium_mg: f64,
}

impl Default for Targets {
    fn default() -> Self {
        Self {
            protein_pct: 35.0,
            fat_pct: 30.0,
            carb_pct: 35.0,
            calories_kcal: 2000.0,
            calorie_scale_kcal: 2400.0,
            calorie_bands_kcal: [1600.0, 1800.0, 2200.0],
            sodium_mg: 2300.0,
            fiber_g: 28.0,
            added_sugar_g: 50.0,
            potassium_mg: 3400.0,
        }
    }
}

impl Targets {
    pub fn validate(&self) -> Result<(), String> {
        let pct_sum = self.protein_pct + self.fat_pct + self.carb_pct;
        if (pct_sum - 100.0).abs() > 0.5 {
            return Err(format!("Macro targets must add up to 100% (got {pct_sum:.1}%)"));
        }
        if self.calorie_scale_kcal <= 0.0 || self.calories_kcal <= 0.0 {
            return Err("Calorie target and scale must be positive".to_string());
        }
        let [low, ok, high] = self.calorie_bands_kcal;
        if !(low <= ok && ok <= high && high <= self.calorie_scale_kcal) {
            return Err("Calorie bands must be ascending and within the scale".to_string());
        }
        let micros = [self.sodium_mg, self.fiber_g, self.added_sugar_g, self.potassium_mg];
        if micros.iter().any(|v| *v <= 0.0) {
            return Err("Micronutrient targets must be positive".to_string());
        }
        Ok(())
    }
}

/// Resolved once at start-up and handed to every command.
#[derive(Clone, Debug)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub targets: Targets,
}

impl Settings {
    pub fn default_data_dir() -> ServiceResult<PathBuf> {
        let home = dirs::home_dir().ok_or(ServiceError::NoHomeDir)?;
        Ok(home.join(DEFAULT_DATA_DIR))
    }

    pub fn load(data_dir: Option<PathBuf>) -> ServiceResult<Self> {
        let data_dir = match data_dir {
            Some(dir) => dir,
            None => Self::default_data_dir()?,
        };
        let targets = Self::load_targets(&data_dir.join(SETTINGS_FILE))?;
        tracing::debug!(data_dir = %data_dir.display(), "settings resolved");
        Ok(Self { data_dir, targets })
    }

    fn load_targets(path: &Path) -> ServiceResult<Targets> {
        let Some(text) = read_optional(path)? else {
            return Ok(Targets::default());
        };
        if text.trim().is_empty() {
            return Ok(Targets::default());
        }
        let targets: Targets = match serde_json::from_str(&text) {
            Ok(targets) => targets,
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "unreadable settings, using defaults"
                );
                return Ok(Targets::default());
            }
        };
        if let Err(msg) = targets.validate() {
            tracing::warn!(path = %path.display(), "{msg}; using defaults");
            return Ok(Targets::default());
        }
        Ok(targets)
    }

    pub fn save_targets(&self) -> ServiceResult<()> {
        let content = serde_json::to_string_pretty(&self.targets)?;
        write_atomic(&self.data_dir.join(SETTINGS_FILE), content.as_bytes())?;
        Ok(())
    }

    pub fn catalog(&self) -> ServiceResult<FoodCatalog> {
        FoodCatalog::open(self.data_dir.join(FOODS_FILE))
    }

    pub fn daily_log(&self) -> DailyLog {
        DailyLog::new(self.data_dir.join(LOG_FILE))
    }

    pub fn profile_store(&self) -> ProfileStore {
        ProfileStore::new(self.data_dir.join(PROFILE_FILE))
    }
}
