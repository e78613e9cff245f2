//! Solar Insight - exploratory analysis of solar irradiance measurements
//!
//! Pipeline: [`data`] loads and cleans per-country CSV files, [`stats`]
//! derives statistics, outliers and correlations, [`charts`] renders them.

pub mod charts;
pub mod config;
pub mod data;
pub mod stats;

pub use config::AnalysisConfig;
pub use data::{Country, DataLoader, MeasurementTable};
pub use stats::DataAnalyzer;
