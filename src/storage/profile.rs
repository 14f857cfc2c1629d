use std::path::{Path, PathBuf};

use super::{read_optional, write_atomic};
use crate::error::ServiceResult;
use crate::types::UserProfile;

pub struct ProfileStore {
    path: PathBuf,
}

impl ProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing, empty or unreadable files give the blank profile.
    pub fn load(&self) -> ServiceResult<UserProfile> {
        let Some(text) = read_optional(&self.path)? else {
            return Ok(UserProfile::default());
        };
        if text.trim().is_empty() {
            return Ok(UserProfile::default());
        }
        match serde_json::from_str::<Option<UserProfile>>(&text) {
            Ok(profile) => Ok(profile.unwrap_or_default()),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "unreadable profile, starting blank"
                );
                Ok(UserProfile::default())
            }
        }
    }

    pub fn save(&self, profile: &UserProfile) -> ServiceResult<()> {
        let content = serde_json::to_string_pretty(profile)?;
        write_atomic(&self.path, content.as_bytes())?;
        Ok(())
    }

    /// Writes only when `profile` differs from what is stored.
    pub fn save_if_changed(&self, profile: &UserProfile) -> ServiceResult<bool> {
        if self.load()? == *profile && self.path.exists() {
            return Ok(false);
        }
        self.save(profile)?;
        tracing::info!(path = %self.path.display(), "profile saved");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Sex;

    #[test]
    fn missing_profile_is_blank() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(dir.path().join("profile.json"));
        assert_eq!(store.load().unwrap(), UserProfile::default());
    }

    #[test]
    fn writes_only_on_change() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(dir.path().join("profile.json"));
        let profile = UserProfile {
            sex: Sex::Male,
            age_years: 30.0,
            height_cm: 175.0,
            weight_kg: 70.0,
        };

        assert!(store.save_if_changed(&profile).unwrap());
        assert!(!store.save_if_changed(&profile).unwrap());
        assert_eq!(store.load().unwrap(), profile);

        let heavier = UserProfile {
            weight_kg: 71.5,
            ..profile
        };
        assert!(store.save_if_changed(&heavier).unwrap());
        assert_eq!(store.load().unwrap().weight_kg, 71.5);
    }

    #[test]
    fn reads_stored_field_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.json");
        std::fs::write(
            &path,
            r#"{"sex": "Female", "age": 25.0, "height_cm": 165.0, "weight_kg": 60.0}"#,
        )
        .unwrap();
        let profile = ProfileStore::new(path).load().unwrap();
        assert_eq!(profile.sex, Sex::Female);
        assert_eq!(profile.age_years, 25.0);
        assert_eq!(profile.height_cm, 165.0);
    }
}
