use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Error, Result};

pub const DEFAULT_TEMPLATE_PATH: &str = "Assets/Templates/Movie Template.md";
pub const DEFAULT_OUTPUT_FOLDER: &str = "Movies/MovieData";

// Persisted settings. Missing fields fall back to the defaults below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub metadata_api_key: String,
    pub ratings_api_key: String, // empty disables the rating lookup
    pub template_path: String,
    pub output_folder: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            metadata_api_key: String::new(),
            ratings_api_key: String::new(),
            template_path: DEFAULT_TEMPLATE_PATH.to_string(),
            output_folder: DEFAULT_OUTPUT_FOLDER.to_string(),
        }
    }
}

impl Settings {
    /// The metadata provider key, or `None` when unset.
    pub fn metadata_key(&self) -> Option<&str> {
        non_blank(&self.metadata_api_key)
    }

    /// The ratings provider key. `None` means the rating feature is disabled.
    pub fn ratings_key(&self) -> Option<&str> {
        non_blank(&self.ratings_api_key)
    }

    pub fn get(&self, key: SettingKey) -> &str {
        match key {
            SettingKey::MetadataApiKey => &self.metadata_api_key,
            SettingKey::RatingsApiKey => &self.ratings_api_key,
            SettingKey::TemplatePath => &self.template_path,
            SettingKey::OutputFolder => &self.output_folder,
        }
    }

    pub fn set(&mut self, key: SettingKey, value: impl Into<String>) {
        let value = value.into().trim().to_string();
        match key {
            SettingKey::MetadataApiKey => self.metadata_api_key = value,
            SettingKey::RatingsApiKey => self.ratings_api_key = value,
            SettingKey::TemplatePath => self.template_path = value,
            SettingKey::OutputFolder => self.output_folder = value,
        }
    }
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Names accepted by `config set`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    MetadataApiKey,
    RatingsApiKey,
    TemplatePath,
    OutputFolder,
}

impl SettingKey {
    pub const ALL: [SettingKey; 4] = [
        SettingKey::MetadataApiKey,
        SettingKey::RatingsApiKey,
        SettingKey::TemplatePath,
        SettingKey::OutputFolder,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKey::MetadataApiKey => "metadata-api-key",
            SettingKey::RatingsApiKey => "ratings-api-key",
            SettingKey::TemplatePath => "template-path",
            SettingKey::OutputFolder => "output-folder",
        }
    }

    pub fn is_secret(&self) -> bool {
        matches!(self, SettingKey::MetadataApiKey | SettingKey::RatingsApiKey)
    }
}

impl FromStr for SettingKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        SettingKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s.trim())
            .ok_or_else(|| Error::UnknownSetting(s.to_string()))
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Show only the last four characters of a secret.
pub fn mask(value: &str) -> String {
    let count = value.chars().count();
    if count == 0 {
        return "(unset)".to_string();
    }
    if count <= 4 {
        return "*".repeat(count);
    }
    let tail: String = value.chars().skip(count - 4).collect();
    format!("{}{}", "*".repeat(count - 4), tail)
}

// Default settings file location
pub fn default_settings_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cinenote")
        .join("settings.json")
}

// Load settings from disk. A missing or unreadable file yields defaults.
pub fn load_settings(path: &Path) -> Settings {
    if !path.exists() {
        return Settings::default();
    }

    match std::fs::read_to_string(path)
        .map_err(Error::from)
        .and_then(|content| serde_json::from_str(&content).map_err(Error::from))
    {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!("Ignoring unreadable settings file {}: {e}", path.display());
            Settings::default()
        }
    }
}

// Save settings to disk
pub fn save_settings(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, content)?;
    Ok(())
}
