mod app;
mod color;
mod config;
mod state;
mod ui;

use std::path::Path;

use anyhow::{Context, Result};
use app::AnnotatorApp;
use clap::Parser;
use config::Cli;
use eframe::egui;
use hmm_annotator::data::{Counts, DatasetSession, SessionConfig};
use serde::Serialize;

#[derive(Serialize)]
struct Summary<'a> {
    root: &'a Path,
    counts: Counts,
    recordings: &'a [String],
}

fn print_summary(root: &Path, config: SessionConfig) -> Result<()> {
    let session = DatasetSession::open(root, config)
        .with_context(|| format!("opening storage root {}", root.display()))?;
    let summary = Summary {
        root,
        counts: session.counts().context("counting recordings")?,
        recordings: session.listing(),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let settings = cli.settings();

    if cli.summary {
        if let Some(root) = &cli.root {
            return print_summary(root, settings.session);
        }
    }

    let mut app = AnnotatorApp::new(settings);
    if let Some(root) = &cli.root {
        app.state.open_root(root);
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1300.0, 850.0])
            .with_min_inner_size([700.0, 450.0]),
        ..Default::default()
    };

    eframe::run_native(
        "HMM Annotator",
        options,
        Box::new(|_cc| Ok(Box::new(app))),
    )
    .map_err(|e| anyhow::anyhow!("running the UI: {e}"))
}
