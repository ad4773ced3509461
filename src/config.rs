//! Configuration
//!
//! Preview defaults for sessions started from the CLI.
//! Config is stored in `~/.config/action-form/config.toml`.
//!
//! ## Priority Order (highest to lowest)
//!
//! 1. Environment variables (`ACTION_FORM_THEME`, `ACTION_FORM_LANGUAGE`)
//! 2. Config file
//! 3. Defaults

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ActionFormError, Result};
use crate::host::HostSettings;

pub const THEME_ENV: &str = "ACTION_FORM_THEME";
pub const LANGUAGE_ENV: &str = "ACTION_FORM_LANGUAGE";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FormConfig {
    #[serde(default)]
    pub preview: PreviewConfig,

    #[serde(default)]
    pub fallback: FallbackConfig,
}

/// Settings used until a host pushes its own
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PreviewConfig {
    pub theme: Option<String>,
    pub language: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FallbackConfig {
    /// Wait for Enter after showing a local completion
    #[serde(default)]
    pub interactive: bool,
}

impl FormConfig {
    /// `~/.config/action-form/` on Unix, `%APPDATA%/action-form/` on Windows
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("action-form")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load from the default location; defaults if the file is absent
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load from `path`. Missing file → defaults, malformed file → error.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ActionFormError::ConfigError {
            reason: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        toml::from_str(&content).map_err(|e| ActionFormError::ConfigError {
            reason: format!("Failed to parse config file {}: {}", path.display(), e),
        })
    }

    /// Environment variables take precedence over config file values
    pub fn with_env(self) -> Self {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    pub fn with_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(theme) = lookup(THEME_ENV).filter(|v| !v.is_empty()) {
            self.preview.theme = Some(theme);
        }
        if let Some(language) = lookup(LANGUAGE_ENV).filter(|v| !v.is_empty()) {
            self.preview.language = Some(language);
        }
        self
    }

    /// Initial bridge settings
    pub fn host_settings(&self) -> HostSettings {
        let defaults = HostSettings::default();
        HostSettings {
            theme: self.preview.theme.clone().unwrap_or(defaults.theme),
            language: self.preview.language.clone().unwrap_or(defaults.language),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn config_path_is_namespaced() {
        let path = FormConfig::config_path();
        assert!(path.to_string_lossy().contains("action-form"));
        assert!(path.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = FormConfig::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config, FormConfig::default());
        assert_eq!(config.host_settings(), HostSettings::default());
    }

    #[test]
    fn file_values_are_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[preview]\ntheme = \"dark\"\n\n[fallback]\ninteractive = true\n").unwrap();

        let config = FormConfig::load_from(&path).unwrap();
        assert_eq!(config.preview.theme.as_deref(), Some("dark"));
        assert!(config.fallback.interactive);
        assert_eq!(config.host_settings().language, "en");
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[preview\n").unwrap();
        assert_eq!(FormConfig::load_from(&path).unwrap_err().code(), "AF-030");
    }

    #[test]
    fn env_overrides_file() {
        let config = FormConfig {
            preview: PreviewConfig {
                theme: Some("light".into()),
                language: Some("de".into()),
            },
            ..FormConfig::default()
        }
        .with_env_from(|key| match key {
            THEME_ENV => Some("dark".into()),
            LANGUAGE_ENV => Some(String::new()),
            _ => None,
        });

        assert_eq!(config.preview.theme.as_deref(), Some("dark"));
        assert_eq!(config.preview.language.as_deref(), Some("de"));
    }
}
