use std::io::Write;
use std::path::PathBuf;

use chrono::{Local, TimeZone};
use clap::{Parser, Subcommand, ValueEnum};

use crate::app::App;
use crate::error::AppResult;
use crate::settings::AppSettings;
use crate::share::{ShareFormat, WlCopyShareTarget};
use crate::storage::{AnalysisRecord, HistoryFilter, PREVIEW_CHARS};
use crate::theme::ThemeMode;

#[derive(Debug, Parser)]
#[command(name = "plantai", version)]
#[command(about = "Diagnose plant leaf health from a photo", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Analyze a leaf photo and store the report
    Analyze {
        /// Path to the leaf photo
        image: PathBuf,
    },
    /// List stored analyses, most recent first
    History {
        /// Only list favorites
        #[arg(long)]
        favorites: bool,
    },
    /// Show the three most recent analyses
    Recent,
    /// Print a full report
    Show { id: String },
    /// Toggle or set the favorite flag
    Favorite {
        id: String,
        /// Set instead of toggling
        value: Option<Switch>,
    },
    /// Delete one analysis
    Delete { id: String },
    /// Copy a report to the clipboard
    Share {
        id: String,
        /// Copy a base64 data URI instead of plain text
        #[arg(long)]
        data_uri: bool,
    },
    /// Show or change the theme
    Theme { change: Option<ThemeChange> },
    /// Show or change a setting
    Settings {
        /// notifications, high-quality-images or auto-save
        #[arg(requires = "value", conflicts_with = "reset")]
        name: Option<String>,
        value: Option<Switch>,
        /// Restore every setting to its default
        #[arg(long)]
        reset: bool,
    },
    /// Delete all analyses and settings
    Clear {
        /// Confirm the deletion
        #[arg(long, required = true)]
        yes: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Switch {
    On,
    Off,
}

impl From<Switch> for bool {
    fn from(value: Switch) -> Self {
        value == Switch::On
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ThemeChange {
    Toggle,
    Light,
    Dark,
}

pub fn execute<W: Write>(app: &App, command: Command, out: &mut W) -> AppResult<()> {
    match command {
        Command::Analyze { image } => {
            let report = app.analyze_file(&image)?;
            if !report.persisted {
                tracing::warn!(id = %report.record.id, "analysis was not saved to history");
            }
            writeln!(out, "{}", report.record.id)?;
            writeln!(out, "\n{}", report.record.result_text)?;
        }
        Command::History { favorites } => {
            let filter = if favorites {
                HistoryFilter::Favorites
            } else {
                HistoryFilter::All
            };
            write_records(out, &app.history(filter))?;
        }
        Command::Recent => write_records(out, &app.recent())?,
        Command::Show { id } => {
            let record = app.record(&id)?;
            writeln!(
                out,
                "{}{}\n\n{}",
                format_timestamp(record.created_at),
                if record.is_favorite { "  *" } else { "" },
                record.result_text
            )?;
        }
        Command::Favorite { id, value } => {
            let favorite = app.favorite(&id, value.map(bool::from))?;
            writeln!(out, "{id}: favorite {}", switch_label(favorite))?;
        }
        Command::Delete { id } => {
            app.delete(&id)?;
            writeln!(out, "deleted {id}")?;
        }
        Command::Share { id, data_uri } => {
            let format = if data_uri {
                ShareFormat::DataUri
            } else {
                ShareFormat::Text
            };
            app.share(&id, format, &WlCopyShareTarget)?;
            writeln!(out, "copied {id} to the clipboard")?;
        }
        Command::Theme { change } => {
            let mode = match change {
                None => app.theme().mode(),
                Some(ThemeChange::Toggle) => app.toggle_theme()?,
                Some(ThemeChange::Light) => set_theme(app, ThemeMode::Light)?,
                Some(ThemeChange::Dark) => set_theme(app, ThemeMode::Dark)?,
            };
            writeln!(out, "{}", mode.as_str())?;
        }
        Command::Settings { name, value, reset } => {
            let settings = match (name, value) {
                _ if reset => app.reset_settings()?,
                (Some(name), Some(value)) => app.update_setting(&name, value.into())?,
                _ => app.settings(),
            };
            write_settings(out, &settings)?;
        }
        Command::Clear { .. } => {
            app.clear_all()?;
            writeln!(out, "all analyses and settings removed")?;
        }
    }
    Ok(())
}

fn set_theme(app: &App, mode: ThemeMode) -> AppResult<ThemeMode> {
    app.theme().set_mode(mode)?;
    Ok(mode)
}

fn write_records<W: Write>(out: &mut W, records: &[AnalysisRecord]) -> AppResult<()> {
    if records.is_empty() {
        writeln!(out, "no analyses yet")?;
        return Ok(());
    }
    for record in records {
        writeln!(
            out,
            "{}  {}{}\n    {}",
            record.id,
            format_timestamp(record.created_at),
            if record.is_favorite { "  *" } else { "" },
            record.preview(PREVIEW_CHARS).replace('\n', " ")
        )?;
    }
    Ok(())
}

fn write_settings<W: Write>(out: &mut W, settings: &AppSettings) -> AppResult<()> {
    for (name, value) in settings.entries() {
        writeln!(out, "{name}: {}", switch_label(value))?;
    }
    Ok(())
}

fn switch_label(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

/// Local `dd/mm/yyyy hh:mm` rendering of an epoch-millisecond timestamp.
pub fn format_timestamp(epoch_millis: u64) -> String {
    i64::try_from(epoch_millis)
        .ok()
        .and_then(|millis| Local.timestamp_millis_opt(millis).single())
        .map(|time| time.format("%d/%m/%Y %H:%M").to_string())
        .unwrap_or_else(|| epoch_millis.to_string())
}
