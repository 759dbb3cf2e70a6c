use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::persistence::{PersistenceError, SharedKeyValueStore, SETTINGS_KEY};

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error("failed to encode settings: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("unknown setting: {0}")]
    UnknownSetting(String),
}

pub type SettingsResult<T> = std::result::Result<T, SettingsError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    #[serde(default = "enabled")]
    pub notifications: bool,
    #[serde(default = "enabled")]
    pub high_quality_images: bool,
    #[serde(default = "enabled")]
    pub auto_save: bool,
}

fn enabled() -> bool {
    true
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            notifications: true,
            high_quality_images: true,
            auto_save: true,
        }
    }
}

impl AppSettings {
    pub const NAMES: [&'static str; 3] = ["notifications", "high-quality-images", "auto-save"];

    /// Sets a toggle by its command-line name.
    pub fn set_by_name(&mut self, name: &str, value: bool) -> SettingsResult<()> {
        match name {
            "notifications" => self.notifications = value,
            "high-quality-images" => self.high_quality_images = value,
            "auto-save" => self.auto_save = value,
            other => return Err(SettingsError::UnknownSetting(other.to_string())),
        }
        Ok(())
    }

    pub fn entries(&self) -> [(&'static str, bool); 3] {
        [
            (Self::NAMES[0], self.notifications),
            (Self::NAMES[1], self.high_quality_images),
            (Self::NAMES[2], self.auto_save),
        ]
    }
}

/// Flat settings blob, fully overwritten on every change.
pub struct SettingsStore {
    kv: SharedKeyValueStore,
}

impl SettingsStore {
    pub fn new(kv: SharedKeyValueStore) -> Self {
        Self { kv }
    }

    pub fn load(&self) -> AppSettings {
        match self.kv.get(SETTINGS_KEY) {
            Ok(Some(serialized)) => serde_json::from_str(&serialized).unwrap_or_else(|err| {
                tracing::warn!(?err, "stored settings are malformed; using defaults");
                AppSettings::default()
            }),
            Ok(None) => AppSettings::default(),
            Err(err) => {
                tracing::warn!(?err, "failed to load settings; using defaults");
                AppSettings::default()
            }
        }
    }

    pub fn save(&self, settings: &AppSettings) -> SettingsResult<()> {
        let serialized = serde_json::to_string(settings)?;
        self.kv.set(SETTINGS_KEY, &serialized)?;
        Ok(())
    }

    pub fn update<F>(&self, apply: F) -> SettingsResult<AppSettings>
    where
        F: FnOnce(&mut AppSettings) -> SettingsResult<()>,
    {
        let mut settings = self.load();
        apply(&mut settings)?;
        self.save(&settings)?;
        Ok(settings)
    }

    pub fn reset(&self) -> SettingsResult<()> {
        self.kv.remove(SETTINGS_KEY)?;
        Ok(())
    }
}
