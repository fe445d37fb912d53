//! Player settings and preferences
//!
//! Read from a small JSON file the player edits by hand. Anything missing
//! from the file keeps its default.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::tuning::{ConfigError, Difficulty, Tuning};

/// Player settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Initials submitted with the final score
    pub initials: String,
    /// Leaderboard the score is submitted to
    pub game_slug: String,
    /// Balance preset
    pub difficulty: Difficulty,
    /// Fixed seed for reproducible runs (random when unset)
    pub seed: Option<u64>,
    /// Where the local leaderboard is kept (not saved when unset)
    pub leaderboard_path: Option<String>,
    /// Optional balance overrides layered over the difficulty preset
    pub tuning_path: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            initials: "AAA".to_string(),
            game_slug: "millipede".to_string(),
            difficulty: Difficulty::Normal,
            seed: None,
            leaderboard_path: None,
            tuning_path: None,
        }
    }
}

impl Settings {
    /// Load settings from disk; a missing file gives the defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("Using default settings");
            return Ok(Self::default());
        }
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let settings: Settings = serde_json::from_str(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Balance for this player: the difficulty preset, or the override file if one is set
    pub fn tuning(&self) -> Result<Tuning, ConfigError> {
        let Some(path) = &self.tuning_path else {
            return Ok(Tuning::for_difficulty(self.difficulty));
        };
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let tuning = Tuning::from_json(&json)?;
        log::info!("Loaded tuning overrides from {}", path);
        Ok(tuning)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("millipede-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"initials":"ZED","difficulty":"Hard"}"#).unwrap();
        assert_eq!(settings.initials, "ZED");
        assert_eq!(settings.difficulty, Difficulty::Hard);
        assert_eq!(settings.game_slug, "millipede");
        assert_eq!(settings.seed, None);
    }

    #[test]
    fn test_missing_file_is_default() {
        let settings = Settings::load(temp_path("absent.json")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_load_written_file() {
        let path = temp_path("settings.json");
        std::fs::write(&path, r#"{"initials":"QQQ","seed":77,"leaderboard_path":"scores.json"}"#)
            .unwrap();
        let loaded = Settings::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded.initials, "QQQ");
        assert_eq!(loaded.seed, Some(77));
        assert_eq!(loaded.leaderboard_path.as_deref(), Some("scores.json"));
        assert_eq!(loaded.difficulty, Difficulty::Normal);
    }

    #[test]
    fn test_malformed_file_is_error() {
        let path = temp_path("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        let result = Settings::load(&path);
        let _ = std::fs::remove_file(&path);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_tuning_follows_difficulty() {
        let settings = Settings {
            difficulty: Difficulty::Easy,
            ..Default::default()
        };
        assert_eq!(
            settings.tuning().unwrap(),
            Tuning::for_difficulty(Difficulty::Easy)
        );
    }

    #[test]
    fn test_tuning_override_file() {
        let path = temp_path("tuning.json");
        std::fs::write(&path, r#"{"ddt_count":7}"#).unwrap();
        let settings = Settings {
            tuning_path: Some(path.display().to_string()),
            ..Default::default()
        };
        let tuning = settings.tuning();
        let _ = std::fs::remove_file(&path);
        assert_eq!(tuning.unwrap().ddt_count, 7);
    }
}
