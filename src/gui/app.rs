//! Solar Insight Main Application
//! Main window with control panel and chart viewer.

use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction};
use anyhow::Context;
use egui::SidePanel;
use rayon::prelude::*;
use solar_insight::charts::{save_artifacts, CountrySummary, Visualizer};
use solar_insight::data::load_cleaned_data;
use solar_insight::{AnalysisConfig, Country, MeasurementTable};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread;

const SUMMARY_FILE: &str = "summary.json";

/// Loading result from background thread
enum LoadResult {
    Progress(f32, String),
    Complete {
        tables: BTreeMap<Country, MeasurementTable>,
        summaries: Vec<CountrySummary>,
    },
    Error(String),
}

/// Main application window.
pub struct SolarDashboard {
    config: AnalysisConfig,
    tables: BTreeMap<Country, MeasurementTable>,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,

    // Async loading
    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,
}

impl SolarDashboard {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: AnalysisConfig) -> Self {
        let mut app = Self {
            control_panel: ControlPanel::new(config.data_dir.clone(), config.metrics.clone()),
            chart_viewer: ChartViewer::new(),
            tables: BTreeMap::new(),
            config,
            load_rx: None,
            is_loading: false,
        };
        app.start_loading();
        app
    }

    /// Load cleaned data in a background thread
    fn start_loading(&mut self) {
        if self.is_loading {
            return;
        }

        self.chart_viewer.clear();
        self.tables.clear();
        self.control_panel.set_countries([]);
        self.control_panel.set_progress(5.0, "Loading cleaned data...");
        self.is_loading = true;

        let (tx, rx) = channel();
        self.load_rx = Some(rx);
        let config = self.config.clone();

        thread::spawn(move || {
            Self::run_loading(tx, config);
        });
    }

    /// Run loading (called from background thread)
    fn run_loading(tx: Sender<LoadResult>, config: AnalysisConfig) {
        let tables = match load_cleaned_data(&config.data_dir) {
            Ok(tables) => tables,
            Err(e) => {
                log::error!("Loading failed: {e}");
                let _ = tx.send(LoadResult::Error(e.to_string()));
                return;
            }
        };

        let _ = tx.send(LoadResult::Progress(
            50.0,
            "Calculating statistics...".to_string(),
        ));

        // Per-country summaries in parallel
        let summaries: Result<Vec<CountrySummary>, _> = tables
            .par_iter()
            .map(|(country, table)| {
                CountrySummary::compute(*country, table, &config.metrics, config.quality_rule)
            })
            .collect();

        match summaries {
            Ok(summaries) => {
                let _ = tx.send(LoadResult::Complete { tables, summaries });
            }
            Err(e) => {
                log::error!("Statistics failed: {e}");
                let _ = tx.send(LoadResult::Error(e.to_string()));
            }
        }
    }

    /// Check for loading results
    fn check_load_results(&mut self) {
        // Take the receiver temporarily to avoid borrow issues
        let Some(rx) = self.load_rx.take() else {
            return;
        };
        let mut should_keep_receiver = true;

        while let Ok(result) = rx.try_recv() {
            match result {
                LoadResult::Progress(progress, status) => {
                    self.control_panel.set_progress(progress, &status);
                }
                LoadResult::Complete { tables, summaries } => {
                    let rows: usize = tables.values().map(MeasurementTable::height).sum();
                    self.control_panel.set_countries(tables.keys().copied());
                    self.control_panel.set_progress(
                        100.0,
                        &format!("Loaded {} countries, {} rows", tables.len(), rows),
                    );
                    self.chart_viewer.set_summaries(summaries);
                    self.tables = tables;
                    self.is_loading = false;
                    should_keep_receiver = false;
                }
                LoadResult::Error(error) => {
                    self.control_panel
                        .set_progress(0.0, &format!("Error: {error}"));
                    self.is_loading = false;
                    should_keep_receiver = false;
                }
            }
        }

        // Put receiver back if still needed
        if should_keep_receiver {
            self.load_rx = Some(rx);
        }
    }

    /// Render all charts for the selected countries into a chosen folder
    fn handle_export_charts(&mut self) {
        let selected = self.control_panel.selected_countries();
        if selected.is_empty() || self.tables.is_empty() {
            self.control_panel.set_progress(0.0, "No data to export");
            return;
        }

        let Some(dir) = rfd::FileDialog::new()
            .set_directory(&self.config.output_dir)
            .pick_folder()
        else {
            return; // User cancelled
        };

        self.control_panel.set_progress(10.0, "Rendering charts...");
        match self.export_to(&dir, &selected) {
            Ok(count) => {
                self.control_panel.set_progress(
                    100.0,
                    &format!("Exported {count} charts to {}", dir.display()),
                );
                if let Err(e) = open::that(&dir) {
                    log::warn!("Cannot open {}: {e}", dir.display());
                }
            }
            Err(e) => {
                log::error!("Export failed: {e:#}");
                self.control_panel
                    .set_progress(0.0, &format!("Error: {e:#}"));
            }
        }
    }

    fn export_to(&self, dir: &Path, countries: &[Country]) -> anyhow::Result<usize> {
        let tables: BTreeMap<Country, MeasurementTable> = self
            .tables
            .iter()
            .filter(|(country, _)| countries.contains(country))
            .map(|(country, table)| (*country, table.clone()))
            .collect();

        let report = Visualizer::from_config(&self.config)
            .render_report(&tables, &self.config.metrics)
            .context("rendering charts")?;
        let paths: Vec<PathBuf> =
            save_artifacts(&report.artifacts, dir).context("saving charts")?;

        let summary_path = dir.join(SUMMARY_FILE);
        let json = serde_json::to_string_pretty(&self.chart_viewer.selected(countries))?;
        fs::write(&summary_path, json)
            .with_context(|| format!("writing {}", summary_path.display()))?;

        for warning in &report.warnings {
            log::info!("{warning}");
        }
        Ok(paths.len())
    }
}

impl eframe::App for SolarDashboard {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Check for background results
        self.check_load_results();

        // Request repaint while loading
        if self.is_loading {
            ctx.request_repaint();
        }

        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(260.0)
            .max_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    match self.control_panel.show(ui) {
                        ControlPanelAction::Reload => self.start_loading(),
                        ControlPanelAction::ExportCharts => self.handle_export_charts(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        // Central panel - Chart Viewer
        let selected = self.control_panel.selected_countries();
        let metric = self.control_panel.metric.clone();
        egui::CentralPanel::default().show(ctx, |ui| {
            self.chart_viewer.show(ui, &metric, &selected);
        });
    }
}
