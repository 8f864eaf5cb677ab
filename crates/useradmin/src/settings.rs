//! Application settings.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Environment variable that overrides the settings file location.
pub const SETTINGS_ENV: &str = "USERADMIN_SETTINGS";

/// Settings loaded at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// `SQLite` database file. Defaults to the platform data directory.
    pub database_path: Option<PathBuf>,
    /// Bcrypt work factor for new password hashes.
    pub bcrypt_cost: u32,
    /// Whether to create the default accounts at startup.
    pub seed_default_accounts: bool,
    /// Log filter used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: None,
            bcrypt_cost: useradmin_core::BcryptHasher::default().cost(),
            seed_default_accounts: true,
            log_filter: "useradmin=info,useradmin_core=info".to_string(),
        }
    }
}

impl Settings {
    /// Location of the settings file.
    #[must_use]
    pub fn path() -> PathBuf {
        if let Some(path) = std::env::var_os(SETTINGS_ENV) {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("useradmin")
            .join("settings.json")
    }

    /// Load settings from file, falling back to defaults if it is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading settings from {}", path.display()))?;

        Self::parse(&contents).with_context(|| format!("parsing settings in {}", path.display()))
    }

    /// Parse settings JSON. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed.
    pub fn parse(contents: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    /// The database file to open.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.database_path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("useradmin")
                .join("useradmin.db")
        })
    }
}
