//! Stats module - descriptive statistics, outlier rules and table analyses

mod analyzer;
mod calculator;
mod outliers;
mod results;

pub use analyzer::{AnalyzerError, DataAnalyzer};
pub use calculator::{StatsCalculator, StatsDelta, SummaryStats, SIGNIFICANCE_THRESHOLD};
pub use outliers::{OutlierFlags, OutlierRule};
pub use results::{
    CleaningEventComparison, CleaningGroups, CleaningImpact, ColumnImpact, CorrelationMatrix,
    GroupSummary, Profile, TimeSeries, WindSamples,
};
