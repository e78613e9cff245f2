//! Visualizer
//! Turns measurement tables into chart artifacts. Charts whose columns are
//! missing are skipped with a [`RenderWarning`] instead of failing.

use super::prep::{BoxSummary, WindRose};
use super::renderer::ChartRenderer;
use super::{ChartArtifact, ChartKey, ChartKind};
use crate::config::AnalysisConfig;
use crate::data::columns::{IRRADIANCE, KEY_VARIABLES, TIMESTAMP, WD, WS};
use crate::data::{CalendarField, Country, MeasurementTable};
use crate::stats::{AnalyzerError, DataAnalyzer};
use plotters::drawing::DrawingAreaErrorKind;
use polars::prelude::PolarsError;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Render error: {0}")]
    Render(String),
    #[error("Cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalyzerError),
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for ChartError {
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        ChartError::Render(err.to_string())
    }
}

/// A chart left out because its input columns are absent.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderWarning {
    pub key: ChartKey,
    pub missing: Vec<String>,
}

impl RenderWarning {
    fn new(key: ChartKey, missing: Vec<String>) -> Self {
        let warning = Self { key, missing };
        log::warn!("{warning}");
        warning
    }
}

impl fmt::Display for RenderWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Skipped {}: missing {}",
            self.key.file_name(),
            self.missing.join(", ")
        )
    }
}

#[derive(Debug, Clone)]
pub enum Rendered {
    Chart(ChartArtifact),
    Skipped(RenderWarning),
}

/// Everything produced by [`Visualizer::render_report`].
#[derive(Debug, Default)]
pub struct RenderReport {
    pub artifacts: Vec<ChartArtifact>,
    pub warnings: Vec<RenderWarning>,
}

impl RenderReport {
    pub fn push(&mut self, rendered: Rendered) {
        match rendered {
            Rendered::Chart(artifact) => self.artifacts.push(artifact),
            Rendered::Skipped(warning) => self.warnings.push(warning),
        }
    }
}

fn missing_columns(table: &MeasurementTable, required: &[&str]) -> Vec<String> {
    required
        .iter()
        .filter(|c| !table.has_column(c))
        .map(|c| c.to_string())
        .collect()
}

pub struct Visualizer {
    renderer: ChartRenderer,
}

impl Visualizer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            renderer: ChartRenderer::new(width, height),
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(config.chart_width, config.chart_height)
    }

    /// Line plot of `columns` over time for one country.
    pub fn time_series(
        &self,
        table: &MeasurementTable,
        country: &str,
        columns: &[&str],
    ) -> Result<Rendered, ChartError> {
        let key = ChartKey::new(ChartKind::TimeSeries, columns.join("_"), Some(country));

        let mut required = vec![TIMESTAMP];
        required.extend_from_slice(columns);
        let missing = missing_columns(table, &required);
        if !missing.is_empty() {
            return Ok(Rendered::Skipped(RenderWarning::new(key, missing)));
        }

        let series = DataAnalyzer::new(table).time_series(columns)?;
        let title = format!("{country}: {}", columns.join(", "));
        let image = self.renderer.time_series(&title, &series)?;
        Ok(Rendered::Chart(ChartArtifact { key, image }))
    }

    /// Distribution of `metric` across countries. Countries without the
    /// column are left out of the chart.
    pub fn boxplot(
        &self,
        tables: &BTreeMap<Country, MeasurementTable>,
        metric: &str,
    ) -> Result<Rendered, ChartError> {
        let key = ChartKey::new(ChartKind::Boxplot, metric, None);

        let mut boxes = Vec::new();
        for (country, table) in tables {
            if !table.has_column(metric) {
                log::warn!("{country} has no {metric} column, left out of boxplot");
                continue;
            }
            let values = table.present_values(metric)?;
            boxes.extend(BoxSummary::from_values(country.name(), &values));
        }

        if boxes.is_empty() {
            return Ok(Rendered::Skipped(RenderWarning::new(
                key,
                vec![metric.to_string()],
            )));
        }

        let title = format!("{metric} by Country");
        let image = self.renderer.boxplot(&title, metric, &boxes)?;
        Ok(Rendered::Chart(ChartArtifact { key, image }))
    }

    /// Wind direction/speed frequency rose for one country.
    pub fn wind_rose(&self, table: &MeasurementTable, country: &str) -> Result<Rendered, ChartError> {
        let key = ChartKey::new(ChartKind::WindRose, "wind", Some(country));
        let missing = missing_columns(table, &[WS, WD]);
        if !missing.is_empty() {
            return Ok(Rendered::Skipped(RenderWarning::new(key, missing)));
        }

        let rose = WindRose::from_samples(&DataAnalyzer::new(table).wind()?);
        let title = format!("{country} Wind Rose");
        let image = self.renderer.wind_rose(&title, &rose)?;
        Ok(Rendered::Chart(ChartArtifact { key, image }))
    }

    /// Correlation heatmap of `columns` for one country.
    pub fn correlation_heatmap(
        &self,
        table: &MeasurementTable,
        country: &str,
        columns: &[&str],
    ) -> Result<Rendered, ChartError> {
        let key = ChartKey::new(ChartKind::Heatmap, "correlation", Some(country));
        let missing = missing_columns(table, columns);
        if !missing.is_empty() {
            return Ok(Rendered::Skipped(RenderWarning::new(key, missing)));
        }

        let matrix = DataAnalyzer::new(table).correlations(columns)?;
        let title = format!("{country} Correlation Heatmap");
        let image = self.renderer.heatmap(&title, &matrix)?;
        Ok(Rendered::Chart(ChartArtifact { key, image }))
    }

    /// Mean of `metric` per hour of day, one line per country.
    pub fn hourly_profile(
        &self,
        tables: &BTreeMap<Country, MeasurementTable>,
        metric: &str,
    ) -> Result<Rendered, ChartError> {
        self.profile(tables, metric, ChartKind::HourlyProfile)
    }

    /// Mean of `metric` per month, one line per country.
    pub fn monthly_profile(
        &self,
        tables: &BTreeMap<Country, MeasurementTable>,
        metric: &str,
    ) -> Result<Rendered, ChartError> {
        self.profile(tables, metric, ChartKind::MonthlyProfile)
    }

    fn profile(
        &self,
        tables: &BTreeMap<Country, MeasurementTable>,
        metric: &str,
        kind: ChartKind,
    ) -> Result<Rendered, ChartError> {
        let key = ChartKey::new(kind, metric, None);
        let field = match kind {
            ChartKind::MonthlyProfile => CalendarField::Month,
            _ => CalendarField::Hour,
        };

        let mut profiles = Vec::new();
        let mut missing = Vec::new();
        for (country, table) in tables {
            let mut absent = missing_columns(table, &[metric]);
            if !table.supports_calendar_field(field) {
                absent.push(TIMESTAMP.to_string());
            }
            if !absent.is_empty() {
                log::warn!("{country} lacks {}, left out of {kind} profile", absent.join(", "));
                missing.extend(absent);
                continue;
            }

            let analyzer = DataAnalyzer::new(table);
            let profile = match field {
                CalendarField::Month => analyzer.monthly_profile(metric)?,
                CalendarField::Hour => analyzer.hourly_profile(metric)?,
            };
            profiles.push((country.name().to_string(), profile));
        }

        if profiles.is_empty() {
            missing.sort();
            missing.dedup();
            return Ok(Rendered::Skipped(RenderWarning::new(key, missing)));
        }

        let (title, x_desc, range) = match kind {
            ChartKind::MonthlyProfile => (format!("{metric} by Month"), "Month", (1, 12)),
            _ => (format!("{metric} by Hour"), "Hour", (0, 23)),
        };
        let image = self.renderer.profiles(&title, x_desc, range, &profiles)?;
        Ok(Rendered::Chart(ChartArtifact { key, image }))
    }

    /// Every chart for the given countries: per-metric comparisons plus a
    /// time series, wind rose and heatmap per country.
    pub fn render_report(
        &self,
        tables: &BTreeMap<Country, MeasurementTable>,
        metrics: &[String],
    ) -> Result<RenderReport, ChartError> {
        let mut report = RenderReport::default();

        for metric in metrics {
            report.push(self.boxplot(tables, metric)?);
            report.push(self.hourly_profile(tables, metric)?);
            report.push(self.monthly_profile(tables, metric)?);
        }

        for (country, table) in tables {
            let name = country.name();
            report.push(self.time_series(table, name, &IRRADIANCE)?);
            report.push(self.wind_rose(table, name)?);
            report.push(self.correlation_heatmap(table, name, &KEY_VARIABLES)?);
        }

        log::info!(
            "Rendered {} charts, skipped {}",
            report.artifacts.len(),
            report.warnings.len()
        );
        Ok(report)
    }
}

/// Save each artifact as PNG under `dir`.
pub fn save_artifacts(artifacts: &[ChartArtifact], dir: &Path) -> Result<Vec<PathBuf>, ChartError> {
    artifacts.iter().map(|a| a.save(dir)).collect()
}
