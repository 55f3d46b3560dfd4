#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use std::path::PathBuf;

use clap::Parser;

use crayons::CrayonsApp;

/// A simple image annotation tool.
#[derive(Parser)]
#[command(name = "crayons", version)]
struct Cli {
    /// Image to open at startup.
    image: Option<PathBuf>,
}

fn main() -> eframe::Result {
    env_logger::init();
    let cli = Cli::parse();

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_title("Crayons")
            .with_inner_size([1000.0, 700.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Crayons",
        options,
        Box::new(move |cc| Ok(Box::new(CrayonsApp::new(cc, cli.image)?))),
    )
}
