//! Result types returned by [`super::DataAnalyzer`].

use super::{StatsDelta, SummaryStats};
use serde::Serialize;
use std::collections::BTreeMap;

/// Pairwise Pearson coefficients. Symmetric, with 1.0 on the diagonal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        Some(self.values[i][j])
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// NaN entries compare equal to each other.
    pub fn is_symmetric(&self) -> bool {
        let n = self.columns.len();
        (0..n).all(|i| {
            (0..n).all(|j| {
                let (a, b) = (self.values[i][j], self.values[j][i]);
                a == b || (a.is_nan() && b.is_nan())
            })
        })
    }
}

/// Statistics of one column before and after a cleaning step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnImpact {
    pub before: SummaryStats,
    pub after: SummaryStats,
    pub delta: StatsDelta,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleaningImpact {
    pub rows_before: usize,
    pub rows_after: usize,
    pub columns: BTreeMap<String, ColumnImpact>,
}

impl CleaningImpact {
    pub fn rows_removed(&self) -> i64 {
        self.rows_before as i64 - self.rows_after as i64
    }

    /// True when the step changed neither the row count nor any statistic.
    pub fn is_zero(&self) -> bool {
        self.rows_before == self.rows_after && self.columns.values().all(|c| c.delta.is_zero())
    }
}

/// Mean and spread of a column within one `Cleaning` group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GroupSummary {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
}

/// One module column split by the `Cleaning` flag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleaningGroups {
    /// Keyed by flag value (0 = no cleaning, 1 = cleaning event)
    pub groups: BTreeMap<i64, GroupSummary>,
    /// Welch t-test between the two groups, when exactly two exist
    pub p_value: Option<f64>,
    pub is_significant: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleaningEventComparison {
    pub columns: BTreeMap<String, CleaningGroups>,
}

/// Timestamp-aligned series for a set of columns.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    pub timestamps: Vec<Option<String>>,
    pub series: BTreeMap<String, Vec<Option<f64>>>,
}

/// Paired wind readings; rows missing either value are dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindSamples {
    /// Degrees from north
    pub direction: Vec<f64>,
    /// m/s
    pub speed: Vec<f64>,
}

impl WindSamples {
    pub fn len(&self) -> usize {
        self.speed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.speed.is_empty()
    }
}

/// Mean of a column per calendar bucket (hour 0-23 or month 1-12).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    pub column: String,
    pub points: Vec<(i32, f64)>,
}
