use crate::media::FallbackPolicy;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

const APP_DIR: &str = "tokgrab";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    /// `text` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: "text".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct DownloadConfig {
    pub output_dir: Option<PathBuf>,
    pub timeout_secs: u64,
    pub fallback: FallbackPolicy,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            timeout_secs: 60,
            fallback: FallbackPolicy::Fail,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    /// RapidAPI key enabling the watermark-free endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub logging: LoggingConfig,
    pub download: DownloadConfig,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file {}", path.display()))
    }

    pub fn get_logging_format(&self) -> &str {
        &self.logging.format
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    pub fn set_api_key(&mut self, key: Option<&str>) {
        self.api_key = key
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string);
    }

    pub fn output_dir(&self) -> PathBuf {
        self.download
            .output_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.download.timeout_secs.max(1))
    }
}

/// Where the config file lives when none exists yet:
/// `$XDG_CONFIG_HOME/tokgrab/config.toml`, else the platform config dir.
pub fn default_config_path() -> Option<PathBuf> {
    if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg_config_home.is_empty() {
            return Some(PathBuf::from(xdg_config_home).join(APP_DIR).join(CONFIG_FILE));
        }
    }

    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

/// Resolves the config file: explicit path, then `TOKGRAB_CONFIG`, then an
/// existing file in the XDG or home config directory.
pub fn get_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var("TOKGRAB_CONFIG") {
        return Some(PathBuf::from(path));
    }

    if let Some(path) = default_config_path() {
        if path.exists() {
            return Some(path);
        }
    }

    if let Some(home) = dirs::home_dir() {
        let path = home.join(".config").join(APP_DIR).join(CONFIG_FILE);
        if path.exists() {
            return Some(path);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.get_logging_format(), "text");
        assert_eq!(config.api_key(), None);
        assert_eq!(config.download.fallback, FallbackPolicy::Fail);
        assert_eq!(config.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_parse_partial_file() {
        let config: Config = toml::from_str(
            r#"
            api_key = "  abc123  "

            [logging]
            format = "json"

            [download]
            fallback = "placeholder"
            output_dir = "/tmp/tok"
            "#,
        )
        .unwrap();

        assert_eq!(config.api_key(), Some("abc123"));
        assert_eq!(config.get_logging_format(), "json");
        assert_eq!(config.download.fallback, FallbackPolicy::Placeholder);
        assert_eq!(config.download.timeout_secs, 60);
        assert_eq!(config.output_dir(), PathBuf::from("/tmp/tok"));
    }

    #[test]
    fn test_blank_api_key_is_absent() {
        let mut config = Config::default();
        config.set_api_key(Some("   "));
        assert_eq!(config.api_key, None);
        config.set_api_key(Some(" key "));
        assert_eq!(config.api_key(), Some("key"));
        config.set_api_key(None);
        assert_eq!(config.api_key(), None);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.set_api_key(Some("secret"));
        config.download.timeout_secs = 15;
        config.save(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.api_key(), Some("secret"));
        assert_eq!(loaded.download.timeout_secs, 15);
    }

    #[test]
    fn test_invalid_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "logging = 5").unwrap();

        let err = Config::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn test_explicit_path_wins() {
        let path = PathBuf::from("/somewhere/custom.toml");
        assert_eq!(get_config_path(Some(&path)), Some(path));
    }
}
