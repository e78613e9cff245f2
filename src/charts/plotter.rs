//! Chart Plotter Module
//! Interactive dashboard plots and tables using egui_plot.

use super::prep::BoxSummary;
use crate::data::columns::GHI;
use crate::data::{Country, MeasurementTable};
use crate::stats::{AnalyzerError, DataAnalyzer, OutlierRule, SummaryStats};
use egui::{Color32, RichText};
use egui_plot::{BoxElem, BoxPlot, BoxSpread, Line, Plot, PlotPoints, Points};
use serde::Serialize;
use std::collections::BTreeMap;

/// Color palette for countries
pub const PALETTE: [Color32; 6] = [
    Color32::from_rgb(52, 152, 219), // Blue
    Color32::from_rgb(231, 76, 60),  // Red
    Color32::from_rgb(46, 204, 113), // Green
    Color32::from_rgb(155, 89, 182), // Purple
    Color32::from_rgb(243, 156, 18), // Orange
    Color32::from_rgb(26, 188, 156), // Teal
];

/// Everything the dashboard shows for one country.
#[derive(Debug, Clone, Serialize)]
pub struct CountrySummary {
    pub country: Country,
    pub rows: usize,
    /// Missing values per column
    pub missing: BTreeMap<String, usize>,
    /// Outlier counts per numeric column
    pub outliers: BTreeMap<String, usize>,
    /// Summary statistics per metric
    pub stats: BTreeMap<String, SummaryStats>,
    #[serde(skip)]
    pub boxes: BTreeMap<String, BoxSummary>,
}

impl CountrySummary {
    /// Metrics absent from the table are skipped.
    pub fn compute(
        country: Country,
        table: &MeasurementTable,
        metrics: &[String],
        quality_rule: OutlierRule,
    ) -> Result<Self, AnalyzerError> {
        let analyzer = DataAnalyzer::new(table);
        let present: Vec<&String> = metrics.iter().filter(|m| table.has_column(m)).collect();

        let mut boxes = BTreeMap::new();
        for metric in &present {
            let values = table.present_values(metric)?;
            if let Some(summary) = BoxSummary::from_values(country.name(), &values) {
                boxes.insert(metric.to_string(), summary);
            }
        }

        Ok(Self {
            country,
            rows: table.height(),
            missing: table.info().missing_values(),
            outliers: analyzer.outlier_counts(&table.numeric_columns(), quality_rule)?,
            stats: analyzer.describe(&present)?,
            boxes,
        })
    }

    pub fn mean_of(&self, metric: &str) -> Option<f64> {
        self.stats
            .get(metric)
            .map(|s| s.mean)
            .filter(|m| !m.is_nan())
    }
}

/// Countries ordered by decreasing mean of `metric`.
pub fn rank_by_mean(summaries: &[&CountrySummary], metric: &str) -> Vec<(Country, f64)> {
    let mut ranking: Vec<(Country, f64)> = summaries
        .iter()
        .filter_map(|s| Some((s.country, s.mean_of(metric)?)))
        .collect();
    ranking.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    ranking
}

/// Creates the dashboard's plots and tables.
pub struct ChartPlotter;

impl ChartPlotter {
    pub fn country_color(index: usize) -> Color32 {
        PALETTE[index % PALETTE.len()]
    }

    /// Boxplot of `metric` with one box per country
    pub fn draw_boxplot_chart(ui: &mut egui::Ui, metric: &str, summaries: &[&CountrySummary]) {
        let labels: Vec<String> = summaries
            .iter()
            .map(|s| s.country.name().to_string())
            .collect();

        Plot::new(format!("boxplot_{metric}"))
            .height(320.0)
            .allow_scroll(false)
            .x_axis_label("Country")
            .y_axis_label(metric)
            .x_axis_formatter(move |mark, _range| {
                let idx = mark.value.round();
                if (mark.value - idx).abs() < 1e-6 && idx >= 0.0 {
                    labels.get(idx as usize).cloned().unwrap_or_default()
                } else {
                    String::new()
                }
            })
            .show(ui, |plot_ui| {
                let mut means: Vec<[f64; 2]> = Vec::new();

                for (i, summary) in summaries.iter().enumerate() {
                    let Some(b) = summary.boxes.get(metric) else {
                        continue;
                    };
                    let x = i as f64;
                    let color = Self::country_color(i);

                    let elem = BoxElem::new(
                        x,
                        BoxSpread::new(b.whisker_low, b.q1, b.median, b.q3, b.whisker_high),
                    )
                    .box_width(0.5)
                    .fill(color.gamma_multiply(0.3))
                    .stroke(egui::Stroke::new(1.5, color));
                    plot_ui.box_plot(BoxPlot::new(vec![elem]).name(summary.country.name()));

                    if !b.outliers.is_empty() {
                        let points: PlotPoints = b.outliers.iter().map(|&y| [x, y]).collect();
                        plot_ui.points(
                            Points::new(points)
                                .radius(2.0)
                                .color(color.gamma_multiply(0.7)),
                        );
                    }
                    means.push([x, b.mean]);
                }

                if means.len() > 1 {
                    plot_ui.line(
                        Line::new(PlotPoints::from(means))
                            .color(Color32::BLACK)
                            .width(1.5)
                            .name("Mean"),
                    );
                }
            });
    }

    /// Summary statistics of `metric`, one row per country
    pub fn draw_stats_table(ui: &mut egui::Ui, metric: &str, summaries: &[&CountrySummary]) {
        Self::framed(ui, |ui| {
            egui::Grid::new(ui.make_persistent_id(format!("stats_table_{metric}")))
                .striped(true)
                .min_col_width(55.0)
                .spacing([8.0, 4.0])
                .show(ui, |ui| {
                    for header in ["Country", "N", "Mean", "Std", "Min", "25%", "50%", "75%", "Max"]
                    {
                        ui.label(RichText::new(header).strong().size(11.0));
                    }
                    ui.end_row();

                    for (i, summary) in summaries.iter().enumerate() {
                        let Some(s) = summary.stats.get(metric) else {
                            continue;
                        };
                        ui.label(
                            RichText::new(summary.country.name())
                                .size(11.0)
                                .color(Self::country_color(i)),
                        );
                        ui.label(RichText::new(s.count.to_string()).size(11.0));
                        for value in [s.mean, s.std, s.min, s.q25, s.median, s.q75, s.max] {
                            ui.label(RichText::new(format!("{value:.3}")).size(11.0));
                        }
                        ui.end_row();
                    }
                });
        });
    }

    /// Missing values and outlier counts per column
    pub fn draw_quality_table(ui: &mut egui::Ui, summary: &CountrySummary) {
        let default_text_color = ui.visuals().text_color();
        Self::framed(ui, |ui| {
            egui::Grid::new(ui.make_persistent_id(format!("quality_{}", summary.country.slug())))
                .striped(true)
                .min_col_width(70.0)
                .show(ui, |ui| {
                    ui.label(RichText::new("Column").strong().size(11.0));
                    ui.label(RichText::new("Missing").strong().size(11.0));
                    ui.label(RichText::new("Outliers").strong().size(11.0));
                    ui.end_row();

                    for (column, missing) in &summary.missing {
                        let outliers = summary.outliers.get(column);
                        let flagged = *missing > 0 || outliers.is_some_and(|&n| n > 0);
                        let color = if flagged {
                            Color32::from_rgb(220, 53, 69)
                        } else {
                            default_text_color
                        };
                        ui.label(RichText::new(column).size(11.0).color(color));
                        ui.label(RichText::new(missing.to_string()).size(11.0));
                        ui.label(
                            RichText::new(outliers.map_or("-".to_string(), |n| n.to_string()))
                                .size(11.0),
                        );
                        ui.end_row();
                    }
                });
        });
    }

    /// Countries ranked by average GHI
    pub fn draw_ranking_table(ui: &mut egui::Ui, ranking: &[(Country, f64)]) {
        Self::framed(ui, |ui| {
            egui::Grid::new("ghi_ranking")
                .striped(true)
                .min_col_width(80.0)
                .show(ui, |ui| {
                    ui.label(RichText::new("#").strong().size(11.0));
                    ui.label(RichText::new("Country").strong().size(11.0));
                    ui.label(RichText::new(format!("Average {GHI}")).strong().size(11.0));
                    ui.end_row();

                    for (rank, (country, mean)) in ranking.iter().enumerate() {
                        ui.label(RichText::new((rank + 1).to_string()).size(11.0));
                        ui.label(RichText::new(country.name()).size(11.0));
                        ui.label(RichText::new(format!("{mean:.2}")).size(11.0));
                        ui.end_row();
                    }
                });
        });
    }

    fn framed(ui: &mut egui::Ui, add_contents: impl FnOnce(&mut egui::Ui)) {
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, add_contents);
    }
}
