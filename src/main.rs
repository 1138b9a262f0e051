mod app;
mod color;
mod config;
mod dashboard;
mod data;
mod report;
mod state;
mod ui;

use std::path::PathBuf;

use anyhow::{Context, Result};
use app::CordExplorerApp;
use clap::Parser;
use config::AppConfig;
use data::loader::{self, LoadMode};
use eframe::egui;
use state::AppState;

#[derive(Parser)]
#[command(name = "cord-explorer", version, about = "Explore CORD-19 paper metadata")]
struct Cli {
    /// CSV file to load (overrides `source` in the config file)
    source: Option<PathBuf>,

    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Initial loading mode (overrides `mode` in the config file)
    #[arg(short, long, value_enum)]
    mode: Option<LoadMode>,

    /// Print a summary to stdout instead of opening the window
    #[arg(long)]
    summary: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AppConfig::default(),
    };
    if let Some(source) = cli.source {
        config.source = source;
    }
    if let Some(mode) = cli.mode {
        config.mode = mode;
    }

    if cli.summary {
        return print_summary(&config);
    }

    let state = AppState::new(config);
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([700.0, 450.0]),
        ..Default::default()
    };

    eframe::run_native(
        "CORD-19 Explorer",
        options,
        Box::new(|cc| Ok(Box::new(CordExplorerApp::new(cc, state)))),
    )
    .map_err(|e| anyhow::anyhow!("running the dashboard: {e}"))
}

fn print_summary(config: &AppConfig) -> Result<()> {
    let result = loader::load(config.mode, &config.source, &config.loader, |progress| {
        log::info!(
            "Loaded {} rows ({:.0}%)",
            progress.rows_loaded,
            progress.fraction * 100.0
        );
    });
    print!("{}", report::render(&result, &config.loader, &config.view));

    if result.dataset().is_none() {
        anyhow::bail!("no data could be loaded from {}", config.source.display());
    }
    Ok(())
}
