use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{CartonError, Result};

/// Data-directory configuration, loaded from `eggcarton.toml`.
///
/// Every field has a sensible default so EggCarton works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Identifier of the master key data keys are wrapped under.
    #[serde(default = "default_key_id")]
    pub key_id: String,

    /// Master keyfile, relative to the data directory.
    #[serde(default = "default_master_key_file")]
    pub master_key_file: String,

    /// SQLite database holding secret records, relative to the data directory.
    #[serde(default = "default_database_file")]
    pub database_file: String,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_key_id() -> String {
    "eggcarton/local".to_string()
}

fn default_master_key_file() -> String {
    "master.key".to_string()
}

fn default_database_file() -> String {
    "secrets.db".to_string()
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            key_id: default_key_id(),
            master_key_file: default_master_key_file(),
            database_file: default_database_file(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the data directory.
    pub const FILE_NAME: &'static str = "eggcarton.toml";

    /// Load settings from `<data_dir>/eggcarton.toml`.
    ///
    /// If the file does not exist, defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let config_path = data_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            CartonError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        Ok(settings)
    }

    /// Write these settings to `<data_dir>/eggcarton.toml`.
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| CartonError::ConfigError(format!("Failed to serialize settings: {e}")))?;
        std::fs::write(data_dir.join(Self::FILE_NAME), contents)?;
        Ok(())
    }

    /// Full path to the master keyfile.
    pub fn master_key_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.master_key_file)
    }

    /// Full path to the secrets database.
    pub fn database_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.database_file)
    }
}

// ── Tests ────────────────────────────────────────────────────────────
