pub mod analysis;
pub mod app;
pub mod capture;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod notification;
pub mod persistence;
pub mod settings;
pub mod share;
pub mod state;
pub mod storage;
pub mod theme;
pub use app::App;
pub use error::{AppError, AppResult};
