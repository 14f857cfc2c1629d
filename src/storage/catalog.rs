use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use super::{read_optional, write_atomic};
use crate::error::ServiceResult;
use crate::types::{FoodProfile, Nutrients};

/// The food library, backed by a JSON object keyed by food name.
///
/// Construct once with [`FoodCatalog::open`] and pass it to whatever needs
/// lookups; edits stay in memory until [`FoodCatalog::save`].
#[derive(Debug)]
pub struct FoodCatalog {
    path: PathBuf,
    foods: BTreeMap<String, FoodProfile>,
}

impl FoodCatalog {
    pub fn open(path: impl Into<PathBuf>) -> ServiceResult<Self> {
        let path = path.into();
        let foods = Self::load(&path)?;
        Ok(Self { path, foods })
    }

    /// Reads the catalog, creating an empty one on disk if it is missing.
    pub fn load(path: &Path) -> ServiceResult<BTreeMap<String, FoodProfile>> {
        let Some(text) = read_optional(path)? else {
            tracing::debug!(path = %path.display(), "catalog missing, initializing");
            write_atomic(path, b"{}")?;
            return Ok(BTreeMap::new());
        };
        if text.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        let raw: Option<BTreeMap<String, Value>> = serde_json::from_str(&text)?;
        let mut foods = BTreeMap::new();
        for (name, attrs) in raw.unwrap_or_default() {
            let name = name.trim().to_string();
            if name.is_empty() {
                tracing::warn!("skipping catalog entry with an empty name");
                continue;
            }
            let nutrients = Nutrients::deserialize(&attrs).unwrap_or_else(|e| {
                tracing::warn!(food = %name, error = %e, "malformed catalog entry, using zeros");
                Nutrients::default()
            });
            foods.insert(name.clone(), FoodProfile::new(name, nutrients));
        }
        tracing::debug!(path = %path.display(), count = foods.len(), "catalog loaded");
        Ok(foods)
    }

    /// Writes `foods` with sorted keys; zero amounts are left out.
    pub fn save_foods(path: &Path, foods: &BTreeMap<String, FoodProfile>) -> ServiceResult<()> {
        let out: BTreeMap<&str, &Nutrients> = foods
            .values()
            .map(|food| (food.name.as_str(), &food.nutrients))
            .collect();
        let content = serde_json::to_string_pretty(&out)?;
        write_atomic(path, content.as_bytes())?;
        tracing::debug!(path = %path.display(), count = foods.len(), "catalog saved");
        Ok(())
    }

    pub fn save(&self) -> ServiceResult<()> {
        Self::save_foods(&self.path, &self.foods)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn foods(&self) -> &BTreeMap<String, FoodProfile> {
        &self.foods
    }

    pub fn get(&self, name: &str) -> Option<&FoodProfile> {
        self.foods.get(name.trim())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.foods.contains_key(name.trim())
    }

    /// Inserts or overwrites. Name validation and add-vs-edit policy belong
    /// to the caller.
    pub fn put(&mut self, name: &str, nutrients: Nutrients) {
        let name = name.trim().to_string();
        self.foods.insert(name.clone(), FoodProfile::new(name, nutrients));
    }

    /// Removes the named foods; returns the names that were present.
    pub fn delete<S: AsRef<str>>(&mut self, names: &[S]) -> Vec<String> {
        names
            .iter()
            .filter_map(|n| self.foods.remove_entry(n.as_ref().trim()))
            .map(|(name, _)| name)
            .collect()
    }
}
