use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use vocab_lib::config::Config;
use vocab_lib::vocab::{Scheduler, SqliteProgressStore};

/// Shared application state for CLI commands
pub struct App {
    pub config: Config,
    pub scheduler: Scheduler<SqliteProgressStore>,
}

impl App {
    /// Load the config and open the database it points to
    pub fn new(config_path: Option<&Path>, db_override: Option<&Path>) -> Result<Self> {
        let config_path = match config_path {
            Some(p) => p.to_path_buf(),
            None => Config::default_path().context("Failed to get data directory")?,
        };
        let config = Config::load(&config_path)
            .with_context(|| format!("Failed to load config {:?}", config_path))?;

        let config_dir = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let db_path = match db_override {
            Some(p) => p.to_path_buf(),
            None => config.database_path(&config_dir),
        };

        let store = SqliteProgressStore::open(db_path.clone())
            .with_context(|| format!("Failed to open database {:?}", db_path))?;
        log::debug!("Using database {:?}", db_path);

        Ok(Self {
            config,
            scheduler: Scheduler::new(store),
        })
    }
}
