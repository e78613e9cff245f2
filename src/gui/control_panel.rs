//! Control Panel Widget
//! Left side panel with country and metric selection and export controls.

use egui::{Color32, ComboBox, RichText};
use solar_insight::Country;
use std::path::PathBuf;

/// Left side control panel.
pub struct ControlPanel {
    pub data_dir: PathBuf,
    /// Loaded countries and whether each is selected
    pub countries: Vec<(Country, bool)>,
    pub metrics: Vec<String>,
    pub metric: String,
    pub progress: f32,
    pub status: String,
}

impl ControlPanel {
    pub fn new(data_dir: PathBuf, metrics: Vec<String>) -> Self {
        let metric = metrics.first().cloned().unwrap_or_default();
        Self {
            data_dir,
            countries: Vec::new(),
            metrics,
            metric,
            progress: 0.0,
            status: "Ready".to_string(),
        }
    }

    /// Replace the country list after a load; all start selected.
    pub fn set_countries(&mut self, countries: impl IntoIterator<Item = Country>) {
        self.countries = countries.into_iter().map(|c| (c, true)).collect();
    }

    pub fn selected_countries(&self) -> Vec<Country> {
        self.countries
            .iter()
            .filter(|(_, selected)| *selected)
            .map(|(country, _)| *country)
            .collect()
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("☀ Solar Insight")
                    .size(22.0)
                    .color(Color32::from_rgb(243, 156, 18)),
            );
            ui.label(
                RichText::new("Benin · Togo · Sierra Leone")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Data Source Section =====
        ui.label(RichText::new("📁 Data Source").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label(RichText::new(self.data_dir.display().to_string()).size(12.0));
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("🔄 Reload").clicked() {
                            action = ControlPanelAction::Reload;
                        }
                    });
                });
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Country Selection =====
        ui.label(RichText::new("🌍 Countries").size(14.0).strong());
        ui.add_space(5.0);

        if self.countries.is_empty() {
            ui.label(RichText::new("No data loaded").color(Color32::GRAY));
        }
        for (country, selected) in &mut self.countries {
            ui.checkbox(selected, country.name());
        }
        ui.add_space(5.0);
        ui.horizontal(|ui| {
            if ui.small_button("Select All").clicked() {
                self.countries.iter_mut().for_each(|(_, s)| *s = true);
            }
            if ui.small_button("Clear All").clicked() {
                self.countries.iter_mut().for_each(|(_, s)| *s = false);
            }
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Metric Selection =====
        ui.label(RichText::new("📈 Metric").size(14.0).strong());
        ui.add_space(5.0);

        ComboBox::from_id_salt("metric")
            .width(150.0)
            .selected_text(&self.metric)
            .show_ui(ui, |ui| {
                for metric in &self.metrics {
                    ui.selectable_value(&mut self.metric, metric.clone(), metric);
                }
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Action Buttons =====
        ui.vertical_centered(|ui| {
            let export_enabled = self.countries.iter().any(|(_, s)| *s);
            ui.add_enabled_ui(export_enabled, |ui| {
                let button = egui::Button::new(RichText::new("🖼 Export Charts").size(15.0))
                    .min_size(egui::vec2(180.0, 32.0));
                if ui.add(button).clicked() {
                    action = ControlPanelAction::ExportCharts;
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Progress Section =====
        ui.label(RichText::new("📊 Progress").size(14.0).strong());
        ui.add_space(5.0);

        ui.add(
            egui::ProgressBar::new(self.progress / 100.0)
                .show_percentage()
                .animate(self.progress > 0.0 && self.progress < 100.0),
        );

        ui.add_space(5.0);

        let status_color = if self.status.starts_with("Error") {
            Color32::from_rgb(220, 53, 69)
        } else if self.progress >= 100.0 {
            Color32::from_rgb(40, 167, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        action
    }

    /// Set progress and status
    pub fn set_progress(&mut self, progress: f32, status: &str) {
        self.progress = progress;
        self.status = status.to_string();
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    Reload,
    ExportCharts,
}
