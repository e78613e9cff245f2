//! Analysis settings, read from a JSON file with environment overrides.

use crate::data::ImputeStrategy;
use crate::stats::OutlierRule;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default settings file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "solar_insight.json";

pub const DATA_DIR_ENV: &str = "SOLAR_DATA_DIR";
pub const OUTPUT_DIR_ENV: &str = "SOLAR_OUTPUT_DIR";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Directory holding the cleaned per-country CSV files
    pub data_dir: PathBuf,
    /// Directory where rendered charts are written
    pub output_dir: PathBuf,
    /// Rule used when flagging anomalous rows
    pub outlier_rule: OutlierRule,
    /// Rule behind the dashboard's data-quality outlier counts
    pub quality_rule: OutlierRule,
    pub impute: ImputeStrategy,
    /// Metrics offered for cross-country comparison
    pub metrics: Vec<String>,
    pub chart_width: u32,
    pub chart_height: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("output"),
            outlier_rule: OutlierRule::default(),
            quality_rule: OutlierRule::ZScore { threshold: 3.0 },
            impute: ImputeStrategy::default(),
            metrics: vec!["GHI".to_string(), "DNI".to_string(), "DHI".to_string()],
            chart_width: 1000,
            chart_height: 600,
        }
    }
}

impl AnalysisConfig {
    /// Read settings from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// [`Self::load`] followed by the `SOLAR_*` environment overrides.
    pub fn from_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_overrides(
            std::env::var_os(DATA_DIR_ENV).map(PathBuf::from),
            std::env::var_os(OUTPUT_DIR_ENV).map(PathBuf::from),
        );
        Ok(config)
    }

    fn apply_overrides(&mut self, data_dir: Option<PathBuf>, output_dir: Option<PathBuf>) {
        if let Some(dir) = data_dir {
            self.data_dir = dir;
        }
        if let Some(dir) = output_dir {
            self.output_dir = dir;
        }
    }
}
