//! Main application entry point.
//!
//! ```bash
//! inkmirror                          # drawing screen, default config
//! inkmirror --screen reflect         # mirror the shared drawing
//! inkmirror --config ./ink.json      # explicit sync config
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use inkmirror_app::{App, AppConfig};
use inkmirror_core::{ScreenKind, SyncConfig};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Screen {
    Draw,
    Reflect,
}

impl From<Screen> for ScreenKind {
    fn from(screen: Screen) -> Self {
        match screen {
            Screen::Draw => ScreenKind::Draw,
            Screen::Reflect => ScreenKind::Reflect,
        }
    }
}

/// InkMirror - draw on one screen, mirror it on another
#[derive(Parser)]
#[command(name = "inkmirror")]
#[command(version)]
struct Cli {
    /// Screen to open at startup
    #[arg(long, value_enum, default_value = "draw")]
    screen: Screen,

    /// Sync config file (default: <config dir>/inkmirror/config.json)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    log::info!("Starting InkMirror");

    let sync = match &cli.config {
        Some(path) => SyncConfig::load(path),
        None => SyncConfig::load_default(),
    };
    let sync = match sync {
        Ok(sync) => sync,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("inkmirror: {}", e);
            return ExitCode::FAILURE;
        }
    };
    log::info!("Syncing project '{}' via {}", sync.project_id, sync.endpoint);

    let config = AppConfig {
        screen: cli.screen.into(),
        sync,
        ..AppConfig::default()
    };
    match App::run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
