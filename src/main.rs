use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use plantai::cli::{self, Cli};
use plantai::config::load_app_config;
use plantai::App;

fn main() -> anyhow::Result<ExitCode> {
    plantai::logging::init();
    let cli = Cli::parse();

    let config = load_app_config();
    let app = App::from_config(&config).context("failed to initialize PlantAI")?;
    tracing::debug!(command = ?cli.command, "dispatching command");

    let mut stdout = std::io::stdout().lock();
    match cli::execute(&app, cli.command, &mut stdout) {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            tracing::debug!(?err, "command failed");
            eprintln!("{}", err.user_message());
            Ok(ExitCode::FAILURE)
        }
    }
}
