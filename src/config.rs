//! Application configuration
//!
//! Read from `config.toml` in the data directory. Every field has a
//! default, so a missing file or a partial file is fine.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::vocab::models::MASTERY_THRESHOLD;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Data directory not found")]
    DataDirNotFound,
}

pub type Result<T> = std::result::Result<T, ConfigError>;

const APP_DIR: &str = "vocab-srs";
const CONFIG_FILE: &str = "config.toml";
const DATABASE_FILE: &str = "vocab.db";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct Config {
    /// SQLite database; defaults to `vocab.db` next to the config file
    pub database_path: Option<PathBuf>,
    /// Length of a practice session
    pub session_minutes: u32,
    /// Options shown in a multiple-choice question
    pub choice_count: usize,
    /// Correct answers needed for a word to count as mastered
    pub mastery_threshold: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: None,
            session_minutes: 15,
            choice_count: 4,
            mastery_threshold: MASTERY_THRESHOLD,
        }
    }
}

impl Config {
    /// Get the default data directory
    pub fn default_data_dir() -> Result<PathBuf> {
        dirs::data_local_dir()
            .map(|p| p.join(APP_DIR))
            .ok_or(ConfigError::DataDirNotFound)
    }

    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::default_data_dir()?.join(CONFIG_FILE))
    }

    /// Load from a file, falling back to defaults when it does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Database location, resolved against the directory holding the config
    pub fn database_path(&self, config_dir: &Path) -> PathBuf {
        match &self.database_path {
            Some(p) if p.is_absolute() => p.clone(),
            Some(p) => config_dir.join(p),
            None => config_dir.join(DATABASE_FILE),
        }
    }
}
