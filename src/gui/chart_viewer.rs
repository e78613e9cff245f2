//! Chart Viewer Widget
//! Scrollable central panel: metric boxplot, data quality, summary
//! statistics and the GHI ranking for the selected countries.

use egui::{RichText, ScrollArea};
use solar_insight::charts::{rank_by_mean, ChartPlotter, CountrySummary};
use solar_insight::data::columns::GHI;
use solar_insight::Country;

const SECTION_SPACING: f32 = 15.0;

#[derive(Default)]
pub struct ChartViewer {
    pub summaries: Vec<CountrySummary>,
}

impl ChartViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.summaries.clear();
    }

    pub fn set_summaries(&mut self, mut summaries: Vec<CountrySummary>) {
        summaries.sort_by_key(|s| s.country);
        self.summaries = summaries;
    }

    /// Summaries of the given countries, in country order.
    pub fn selected<'a>(&'a self, countries: &[Country]) -> Vec<&'a CountrySummary> {
        self.summaries
            .iter()
            .filter(|s| countries.contains(&s.country))
            .collect()
    }

    pub fn show(&self, ui: &mut egui::Ui, metric: &str, countries: &[Country]) {
        if self.summaries.is_empty() {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No Data").size(20.0));
            });
            return;
        }

        let selected = self.selected(countries);
        if selected.is_empty() {
            ui.centered_and_justified(|ui| {
                ui.label(
                    RichText::new("Please select at least one country to view the analysis.")
                        .size(16.0),
                );
            });
            return;
        }

        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.heading(format!("{metric} Comparison"));
                ChartPlotter::draw_boxplot_chart(ui, metric, &selected);
                ui.add_space(SECTION_SPACING);

                ui.heading("Data Quality Metrics");
                for summary in &selected {
                    egui::CollapsingHeader::new(format!(
                        "Quality Metrics for {} ({} rows)",
                        summary.country, summary.rows
                    ))
                    .id_salt(summary.country.slug())
                    .show(ui, |ui| ChartPlotter::draw_quality_table(ui, summary));
                }
                ui.add_space(SECTION_SPACING);

                ui.heading("Summary Statistics");
                ChartPlotter::draw_stats_table(ui, metric, &selected);
                ui.add_space(SECTION_SPACING);

                ui.heading(format!("Top Regions by Average {GHI}"));
                let ranking = rank_by_mean(&selected, GHI);
                ChartPlotter::draw_ranking_table(ui, &ranking);
            });
    }
}
