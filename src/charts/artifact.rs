//! Rendered chart images and their file naming.

use super::ChartError;
use image::RgbImage;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChartKind {
    TimeSeries,
    Boxplot,
    WindRose,
    Heatmap,
    HourlyProfile,
    MonthlyProfile,
}

impl ChartKind {
    pub fn slug(&self) -> &'static str {
        match self {
            ChartKind::TimeSeries => "time_series",
            ChartKind::Boxplot => "boxplot",
            ChartKind::WindRose => "wind_rose",
            ChartKind::Heatmap => "heatmap",
            ChartKind::HourlyProfile => "hourly",
            ChartKind::MonthlyProfile => "monthly",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Identifies a chart by what it shows. `country` is `None` for charts
/// comparing all countries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChartKey {
    pub kind: ChartKind,
    pub metric: String,
    pub country: Option<String>,
}

impl ChartKey {
    pub fn new(kind: ChartKind, metric: impl Into<String>, country: Option<&str>) -> Self {
        Self {
            kind,
            metric: metric.into(),
            country: country.map(str::to_string),
        }
    }

    /// `<kind>_<metric>_<country>.png`, lower case, `all` for cross-country
    /// charts.
    pub fn file_name(&self) -> String {
        let country = self.country.as_deref().unwrap_or("all");
        format!(
            "{}_{}_{}.png",
            self.kind.slug(),
            file_part(&self.metric),
            file_part(country)
        )
    }
}

fn file_part(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// A rendered chart.
#[derive(Debug, Clone)]
pub struct ChartArtifact {
    pub key: ChartKey,
    pub image: RgbImage,
}

impl ChartArtifact {
    /// Write the image as PNG into `dir`, returning the file path.
    pub fn save(&self, dir: &Path) -> Result<PathBuf, ChartError> {
        fs::create_dir_all(dir).map_err(|source| ChartError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = dir.join(self.key.file_name());
        self.image.save(&path)?;
        log::info!("Saved chart {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name() {
        let key = ChartKey::new(ChartKind::WindRose, "wind", Some("Sierra Leone"));
        assert_eq!(key.file_name(), "wind_rose_wind_sierra_leone.png");

        let key = ChartKey::new(ChartKind::Boxplot, "GHI", None);
        assert_eq!(key.file_name(), "boxplot_ghi_all.png");
    }

    #[test]
    fn test_save_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = ChartArtifact {
            key: ChartKey::new(ChartKind::Heatmap, "correlation", Some("Benin")),
            image: RgbImage::new(8, 4),
        };

        let path = artifact.save(&dir.path().join("charts")).unwrap();
        assert!(path.ends_with("heatmap_correlation_benin.png"));
        let reloaded = image::open(&path).unwrap();
        assert_eq!((reloaded.width(), reloaded.height()), (8, 4));
    }
}
