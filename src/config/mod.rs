use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing HOME environment variable")]
    MissingHomeDirectory,
}

const APP_DIR: &str = "plantai";
const APP_CONFIG_FILE: &str = "config.json";
const API_KEY_ENV: &str = "PLANTAI_API_KEY";

const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_BASE_DELAY_MS: u64 = 1_000;

/// Application-level settings from `config.json`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub max_attempts: Option<u32>,
    #[serde(default)]
    pub base_delay_ms: Option<u64>,
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

impl AppConfig {
    pub fn endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or(DEFAULT_ENDPOINT)
    }

    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or(DEFAULT_MODEL)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
            .filter(|attempts| *attempts > 0)
            .unwrap_or(DEFAULT_MAX_ATTEMPTS)
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms.unwrap_or(DEFAULT_BASE_DELAY_MS))
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

pub fn load_app_config() -> AppConfig {
    let xdg_config_home = env_path("XDG_CONFIG_HOME");
    let home = env_path("HOME");
    let mut config = load_app_config_with(xdg_config_home.as_deref(), home.as_deref());
    if let Some(key) = std::env::var_os(API_KEY_ENV).and_then(|value| value.into_string().ok()) {
        if !key.trim().is_empty() {
            config.api_key = Some(key);
        }
    }
    config
}

fn load_app_config_with(xdg_config_home: Option<&Path>, home: Option<&Path>) -> AppConfig {
    let Ok(path) = config_file_path(xdg_config_home, home) else {
        return AppConfig::default();
    };
    match std::fs::read_to_string(&path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|err| {
            tracing::warn!(?err, ?path, "failed to parse config.json; using defaults");
            AppConfig::default()
        }),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => AppConfig::default(),
        Err(err) => {
            tracing::warn!(?err, ?path, "failed to read config.json; using defaults");
            AppConfig::default()
        }
    }
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var_os(name).map(PathBuf::from)
}

fn config_file_path(xdg_config_home: Option<&Path>, home: Option<&Path>) -> Result<PathBuf, ConfigError> {
    Ok(xdg_root(xdg_config_home, home, ".config")?
        .join(APP_DIR)
        .join(APP_CONFIG_FILE))
}

/// Directory holding the persisted key-value blobs.
pub fn data_dir(config: &AppConfig) -> Result<PathBuf, ConfigError> {
    if let Some(dir) = config
        .data_dir
        .as_ref()
        .filter(|path| !path.as_os_str().is_empty())
    {
        return Ok(dir.clone());
    }
    let xdg_data_home = env_path("XDG_DATA_HOME");
    let home = env_path("HOME");
    data_dir_with(xdg_data_home.as_deref(), home.as_deref())
}

fn data_dir_with(xdg_data_home: Option<&Path>, home: Option<&Path>) -> Result<PathBuf, ConfigError> {
    let mut path = xdg_root(xdg_data_home, home, ".local/share")?;
    path.push(APP_DIR);
    Ok(path)
}

fn xdg_root(
    xdg_home: Option<&Path>,
    home: Option<&Path>,
    home_fallback: &str,
) -> Result<PathBuf, ConfigError> {
    if let Some(xdg) = xdg_home.filter(|path| !path.as_os_str().is_empty()) {
        return Ok(xdg.to_path_buf());
    }

    let home = home.ok_or(ConfigError::MissingHomeDirectory)?;
    Ok(home.join(home_fallback))
}
