//! Solar Insight - Interactive dashboard for cleaned solar measurement data
//!
//! Compares irradiance across Benin, Togo and Sierra Leone and exports the
//! static chart set.

mod gui;

use anyhow::Context;
use eframe::egui;
use gui::SolarDashboard;
use solar_insight::config::{AnalysisConfig, DEFAULT_CONFIG_FILE};
use std::path::Path;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AnalysisConfig::from_env(Path::new(DEFAULT_CONFIG_FILE))
        .context("loading configuration")?;
    log::info!("Reading cleaned data from {}", config.data_dir.display());

    // Configure native options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 800.0])
            .with_min_inner_size([1000.0, 600.0])
            .with_title("Solar Insight"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "Solar Insight",
        options,
        Box::new(|cc| Ok(Box::new(SolarDashboard::new(cc, config)))),
    )
    .map_err(|e| anyhow::anyhow!("dashboard failed: {e}"))
}
