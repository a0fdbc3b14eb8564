//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::calculate::DEFAULT_WORST_WORLD_RANK;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Ladder shape settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardConfig {
    /// Worst world rank, i.e. the number of players on the ladder
    #[serde(default = "default_ladder_size")]
    pub worst_world_rank: u32,

    /// Players a log snapshot must list to be accepted
    #[serde(default = "default_expected_players")]
    pub expected_players: usize,
}

fn default_ladder_size() -> u32 {
    DEFAULT_WORST_WORLD_RANK
}

fn default_expected_players() -> usize {
    DEFAULT_WORST_WORLD_RANK as usize
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            worst_world_rank: default_ladder_size(),
            expected_players: default_expected_players(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Game install directory
    #[serde(default = "default_game_dir")]
    pub game_dir: PathBuf,

    #[serde(default)]
    pub leaderboard: LeaderboardConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_game_dir() -> PathBuf {
    PathBuf::from(r"C:\Program Files (x86)\Steam\steamapps\common\Mechabellum")
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            game_dir: default_game_dir(),
            leaderboard: LeaderboardConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise use defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Directory the game client writes its logs to.
    pub fn log_dir(&self) -> PathBuf {
        self.game_dir.join("ProjectDatas").join("Log")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.leaderboard.worst_world_rank == 0 {
            return Err(ConfigError::ValidationError(
                "Worst world rank must be greater than 0".to_string(),
            ));
        }

        if self.leaderboard.expected_players == 0 {
            return Err(ConfigError::ValidationError(
                "Expected players must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.leaderboard.worst_world_rank, 200);
        assert_eq!(config.leaderboard.expected_players, 200);
    }

    #[test]
    fn test_log_dir() {
        let mut config = AppConfig::default();
        config.game_dir = PathBuf::from("/games/ladder");
        assert_eq!(
            config.log_dir(),
            PathBuf::from("/games/ladder/ProjectDatas/Log")
        );
    }

    #[test]
    fn test_config_validation_ok() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_bad_ladder_size() {
        let mut config = AppConfig::default();
        config.leaderboard.worst_world_rank = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_bad_expected_players() {
        let mut config = AppConfig::default();
        config.leaderboard.expected_players = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            "data_dir = \"/tmp/ladder\"\n\n[leaderboard]\nexpected_players = 100\n",
        )
        .unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/ladder"));
        assert_eq!(config.leaderboard.expected_players, 100);
        assert_eq!(config.leaderboard.worst_world_rank, 200);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_missing_file_falls_back() {
        let temp_dir = TempDir::new().unwrap();
        let config = AppConfig::load_or_default(&temp_dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.leaderboard.worst_world_rank, 200);
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();

        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.data_dir, parsed.data_dir);
        assert_eq!(config.game_dir, parsed.game_dir);
    }
}
