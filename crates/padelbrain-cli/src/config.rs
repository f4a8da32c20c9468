//! Persistent CLI defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

const CONFIG_FILE_NAME: &str = "cli-config.json";
const APP_DIR_NAME: &str = "padelbrain";

pub const DB_PATH_ENV: &str = "PADELBRAIN_DB_PATH";
pub const PROFILE_ENV: &str = "PADELBRAIN_PROFILE";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CliConfig {
    #[serde(default = "default_config_version")]
    pub version: u32,
    #[serde(default)]
    pub db_path: Option<PathBuf>,
    /// Profile selected when `--profile` is not given
    #[serde(default)]
    pub default_profile: Option<String>,
    /// Strategy applied to conflicting imports when `--strategy` is not given
    #[serde(default)]
    pub default_strategy: Option<String>,
}

const fn default_config_version() -> u32 {
    1
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
        .join(CONFIG_FILE_NAME)
}

pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
        .join("padelbrain.db")
}

pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    let value = value?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

impl CliConfig {
    pub fn load() -> Result<Self, String> {
        Self::load_from_path(&default_config_path())
    }

    pub fn load_from_path(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|error| format!("Failed to read config at {}: {}", path.display(), error))?;
        let mut config = serde_json::from_str::<Self>(&raw)
            .map_err(|error| format!("Failed to parse config at {}: {}", path.display(), error))?;
        config.normalize();
        Ok(config)
    }

    pub fn save(&self) -> Result<PathBuf, String> {
        let path = default_config_path();
        self.save_to_path(&path)?;
        Ok(path)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|error| {
                format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    error
                )
            })?;
        }

        let mut normalized = self.clone();
        normalized.normalize();
        let serialized = serde_json::to_string_pretty(&normalized)
            .map_err(|error| format!("Failed to serialize config: {error}"))?;
        std::fs::write(path, serialized)
            .map_err(|error| format!("Failed to write config at {}: {}", path.display(), error))
    }

    /// Flag, then environment, then config file, then the platform data dir
    pub fn resolve_db_path(
        &self,
        explicit: Option<PathBuf>,
        env_value: Option<PathBuf>,
    ) -> PathBuf {
        explicit
            .or(env_value)
            .or_else(|| self.db_path.clone())
            .unwrap_or_else(default_db_path)
    }

    /// Flag, then environment, then config file; `None` keeps the stored active profile
    pub fn resolve_profile(
        &self,
        explicit: Option<&str>,
        env_value: Option<String>,
    ) -> Option<String> {
        normalize_text_option(explicit.map(str::to_string))
            .or_else(|| normalize_text_option(env_value))
            .or_else(|| self.default_profile.clone())
    }

    pub fn resolve_strategy(&self, explicit: Option<String>) -> Option<String> {
        normalize_text_option(explicit).or_else(|| self.default_strategy.clone())
    }

    fn normalize(&mut self) {
        self.default_profile = normalize_text_option(self.default_profile.take());
        self.default_strategy = normalize_text_option(self.default_strategy.take());
        self.db_path = self
            .db_path
            .take()
            .filter(|path| !path.as_os_str().is_empty());
    }
}
