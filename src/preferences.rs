use crate::error::PreferencesError;
use crate::executable::DEFAULT_EXECUTABLE;
use crate::recipe::RecipeOptions;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "rawji-export";
const PREFERENCES_FILE: &str = "preferences.json";

/// Settings remembered between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Program name or path of the converter.
    pub executable: String,
    pub tag: String,
    pub recipe: RecipeOptions,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            executable: DEFAULT_EXECUTABLE.to_string(),
            tag: crate::import::PROVENANCE_TAG.to_string(),
            recipe: RecipeOptions::default(),
        }
    }
}

impl Preferences {
    /// `<config dir>/rawji-export/preferences.json`
    pub fn default_path() -> Result<PathBuf, PreferencesError> {
        let mut path = dirs::config_dir().ok_or(PreferencesError::NoConfigDir)?;
        path.push(APP_DIR);
        path.push(PREFERENCES_FILE);
        Ok(path)
    }

    pub fn load(path: &Path) -> Result<Self, PreferencesError> {
        let text = fs::read_to_string(path).map_err(|source| PreferencesError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| PreferencesError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load preferences, falling back to defaults when the file is missing or
    /// unreadable.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(prefs) => prefs,
            Err(e) => {
                warn!("Ignoring preferences: {}", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), PreferencesError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| PreferencesError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| PreferencesError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(|source| PreferencesError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::{FilmSimulation, WhiteBalance};

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(PREFERENCES_FILE);
        let prefs = Preferences {
            executable: "/opt/rawji/bin/rawji".to_string(),
            tag: "film".to_string(),
            recipe: RecipeOptions {
                film_simulation: Some(FilmSimulation::ClassicNeg),
                white_balance: Some(WhiteBalance::Daylight),
                highlights: -1.0,
                ..Default::default()
            },
        };

        prefs.save(&path).unwrap();
        assert_eq!(Preferences::load(&path).unwrap(), prefs);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = Preferences::load_or_default(&dir.path().join("absent.json"));
        assert_eq!(prefs, Preferences::default());
        assert_eq!(prefs.executable, "rawji");
        assert_eq!(prefs.tag, "rawji");
    }

    #[test]
    fn test_malformed_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PREFERENCES_FILE);
        fs::write(&path, b"[1, 2").unwrap();

        assert!(matches!(Preferences::load(&path), Err(PreferencesError::Json { .. })));
        assert_eq!(Preferences::load_or_default(&path), Preferences::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PREFERENCES_FILE);
        fs::write(&path, br#"{"recipe": {"film_simulation": "acros"}}"#).unwrap();

        let prefs = Preferences::load(&path).unwrap();
        assert_eq!(prefs.executable, "rawji");
        assert_eq!(prefs.recipe.film_simulation, Some(FilmSimulation::Acros));
    }
}
