use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::persistence::{PersistenceError, SharedKeyValueStore, THEME_KEY};

mod palette;

pub use palette::{color_tokens, ColorTokens, DARK_TOKENS, LIGHT_TOKENS};

pub type ThemeResult<T> = std::result::Result<T, ThemeError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

/// Parse a persisted preference. Anything outside `light`/`dark` is `None`.
pub fn parse_theme_mode(value: &str) -> Option<ThemeMode> {
    match value.trim() {
        "light" => Some(ThemeMode::Light),
        "dark" => Some(ThemeMode::Dark),
        _ => None,
    }
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("failed to persist theme preference")]
    Persist(#[from] PersistenceError),
}

/// Process-wide light/dark selection. Built once at startup and handed to
/// every consumer.
pub struct ThemeState {
    kv: SharedKeyValueStore,
    mode: RwLock<ThemeMode>,
}

impl ThemeState {
    pub fn load(kv: SharedKeyValueStore) -> Self {
        let mode = load_theme_preference(&kv).unwrap_or_default();
        tracing::debug!(mode = mode.as_str(), "theme initialized");
        Self {
            kv,
            mode: RwLock::new(mode),
        }
    }

    pub fn mode(&self) -> ThemeMode {
        *self.mode.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn palette(&self) -> ColorTokens {
        color_tokens(self.mode())
    }

    /// Flips the mode. The in-memory value changes even if persisting fails.
    pub fn toggle(&self) -> ThemeResult<ThemeMode> {
        let next = {
            let mut mode = self.mode.write().unwrap_or_else(PoisonError::into_inner);
            *mode = mode.toggled();
            *mode
        };
        self.persist(next)?;
        Ok(next)
    }

    pub fn set_mode(&self, next: ThemeMode) -> ThemeResult<()> {
        *self.mode.write().unwrap_or_else(PoisonError::into_inner) = next;
        self.persist(next)
    }

    fn persist(&self, mode: ThemeMode) -> ThemeResult<()> {
        self.kv.set(THEME_KEY, mode.as_str()).map_err(|err| {
            tracing::warn!(?err, mode = mode.as_str(), "failed to save theme preference");
            ThemeError::from(err)
        })
    }
}

fn load_theme_preference(kv: &SharedKeyValueStore) -> Option<ThemeMode> {
    let stored = match kv.get(THEME_KEY) {
        Ok(stored) => stored?,
        Err(err) => {
            tracing::warn!(?err, "failed to load theme preference; using default");
            return None;
        }
    };
    let mode = parse_theme_mode(&stored);
    if mode.is_none() {
        tracing::warn!(value = %stored, "ignoring unknown theme preference");
    }
    mode
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{
        KeyValueStore, MemoryKeyValueStore, PersistenceResult, SharedKeyValueStore,
    };
    use std::sync::Arc;

    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> PersistenceResult<Option<String>> {
            Ok(None)
        }

        fn set(&self, key: &str, _value: &str) -> PersistenceResult<()> {
            Err(PersistenceError::InvalidKey {
                key: key.to_string(),
            })
        }

        fn remove(&self, _key: &str) -> PersistenceResult<()> {
            Ok(())
        }
    }

    #[test]
    fn theme_defaults_to_light_when_unset() {
        let theme = ThemeState::load(MemoryKeyValueStore::shared());
        assert_eq!(theme.mode(), ThemeMode::Light);
        assert_eq!(theme.palette(), LIGHT_TOKENS);
    }

    #[test]
    fn toggle_persists_and_reload_restores_dark() {
        let kv: SharedKeyValueStore = MemoryKeyValueStore::shared();
        let theme = ThemeState::load(kv.clone());

        assert_eq!(theme.toggle().unwrap(), ThemeMode::Dark);
        assert_eq!(kv.get(THEME_KEY).unwrap().as_deref(), Some("dark"));

        let reloaded = ThemeState::load(kv);
        assert_eq!(reloaded.mode(), ThemeMode::Dark);
        assert_eq!(reloaded.palette(), DARK_TOKENS);
    }

    #[test]
    fn invalid_persisted_value_falls_back_to_light() {
        let kv: SharedKeyValueStore = MemoryKeyValueStore::shared();
        kv.set(THEME_KEY, "system").unwrap();
        assert_eq!(ThemeState::load(kv).mode(), ThemeMode::Light);
    }

    #[test]
    fn toggle_keeps_in_memory_value_when_persist_fails() {
        let theme = ThemeState::load(Arc::new(ReadOnlyStore));
        assert!(theme.toggle().is_err());
        assert_eq!(theme.mode(), ThemeMode::Dark);
    }

    #[test]
    fn set_mode_overwrites_preference() {
        let kv: SharedKeyValueStore = MemoryKeyValueStore::shared();
        let theme = ThemeState::load(kv.clone());
        theme.set_mode(ThemeMode::Dark).unwrap();
        theme.set_mode(ThemeMode::Light).unwrap();
        assert_eq!(kv.get(THEME_KEY).unwrap().as_deref(), Some("light"));
    }

    #[test]
    fn parse_theme_mode_accepts_only_two_values() {
        assert_eq!(parse_theme_mode("light"), Some(ThemeMode::Light));
        assert_eq!(parse_theme_mode("dark\n"), Some(ThemeMode::Dark));
        assert_eq!(parse_theme_mode("Dark"), None);
        assert_eq!(parse_theme_mode(""), None);
    }
}
