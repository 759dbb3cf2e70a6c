use crate::analysis::{AnalysisError, TransportError};
use crate::capture::CaptureError;
use crate::config::ConfigError;
use crate::persistence::PersistenceError;
use crate::settings::SettingsError;
use crate::share::ShareError;
use crate::storage::StorageError;
use crate::theme::ThemeError;
use thiserror::Error;

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Theme(#[from] ThemeError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error(transparent)]
    Share(#[from] ShareError),
    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
    #[error("no analysis with id {0}")]
    UnknownRecord(String),
}

impl AppError {
    /// Message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Analysis(err) => err.user_message().to_string(),
            other => other.to_string(),
        }
    }
}
