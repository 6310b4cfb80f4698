use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::crypto::generator::DEFAULT_LENGTH;
use crate::errors::{Result, VaultError};

/// Project-level configuration, loaded from `.pwvault.toml`.
///
/// Every field has a sensible default so pwvault works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Directory (relative to the working directory) holding the store.
    #[serde(default = "default_vault_dir")]
    pub vault_dir: String,

    /// Database file name inside `vault_dir`.
    #[serde(default = "default_database_file")]
    pub database_file: String,

    /// Key file name inside `vault_dir`.
    #[serde(default = "default_key_file")]
    pub key_file: String,

    /// Length of generated passwords (default: 12).
    #[serde(default = "default_password_length")]
    pub password_length: usize,

    /// Characters never used in generated passwords.
    #[serde(default)]
    pub exclude_chars: String,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_vault_dir() -> String {
    ".pwvault".to_string()
}

fn default_database_file() -> String {
    "passwords.db".to_string()
}

fn default_key_file() -> String {
    "key.key".to_string()
}

fn default_password_length() -> usize {
    DEFAULT_LENGTH
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            vault_dir: default_vault_dir(),
            database_file: default_database_file(),
            key_file: default_key_file(),
            password_length: default_password_length(),
            exclude_chars: String::new(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the working directory.
    const FILE_NAME: &'static str = ".pwvault.toml";

    /// Load settings from `<project_dir>/.pwvault.toml`.
    ///
    /// If the file does not exist, defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)
            .map_err(|e| VaultError::io_at(&config_path, e))?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            VaultError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        if settings.password_length == 0 {
            return Err(VaultError::ConfigError(format!(
                "{}: password_length must be at least 1",
                config_path.display()
            )));
        }

        Ok(settings)
    }

    /// Full path to the store directory.
    ///
    /// Example: `project_dir/.pwvault`
    pub fn vault_dir_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.vault_dir)
    }

    /// Full path to the database file.
    pub fn database_path(&self, project_dir: &Path) -> PathBuf {
        self.vault_dir_path(project_dir).join(&self.database_file)
    }

    /// Full path to the key file.
    pub fn key_path(&self, project_dir: &Path) -> PathBuf {
        self.vault_dir_path(project_dir).join(&self.key_file)
    }
}

// ── Tests ────────────────────────────────────────────────────────────
