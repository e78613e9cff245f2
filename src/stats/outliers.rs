//! Outlier rules and the per-row flags they produce.

use super::StatsCalculator;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Scale factor making the MAD consistent with the standard deviation.
const MAD_SCALE: f64 = 0.6745;
/// Same, for the mean absolute deviation fallback when MAD is zero.
const MEAN_AD_SCALE: f64 = 1.253314;

/// Per-column rule deciding whether a value is anomalous.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum OutlierRule {
    /// `|x - mean| / std > threshold`, population std.
    ZScore { threshold: f64 },
    /// `0.6745 * |x - median| / MAD > threshold`.
    ModifiedZScore { threshold: f64 },
    /// Outside `[q1 - factor * iqr, q3 + factor * iqr]`.
    Iqr { factor: f64 },
}

impl Default for OutlierRule {
    fn default() -> Self {
        OutlierRule::ModifiedZScore { threshold: 3.0 }
    }
}

impl fmt::Display for OutlierRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutlierRule::ZScore { threshold } => write!(f, "|z| > {threshold}"),
            OutlierRule::ModifiedZScore { threshold } => write!(f, "|modified z| > {threshold}"),
            OutlierRule::Iqr { factor } => write!(f, "outside {factor} x IQR"),
        }
    }
}

impl OutlierRule {
    /// One flag per row. Missing values are never flagged.
    pub fn flag(&self, values: &[Option<f64>]) -> Vec<bool> {
        let present: Vec<f64> = values.iter().flatten().copied().collect();
        if present.is_empty() {
            return vec![false; values.len()];
        }

        let score: Box<dyn Fn(f64) -> bool> = match *self {
            OutlierRule::ZScore { threshold } => {
                let mean = StatsCalculator::mean(&present);
                let std = StatsCalculator::population_std(&present);
                if std == 0.0 {
                    Box::new(|_: f64| false)
                } else {
                    Box::new(move |x: f64| ((x - mean) / std).abs() > threshold)
                }
            }
            OutlierRule::ModifiedZScore { threshold } => {
                let median = StatsCalculator::percentile(&StatsCalculator::sorted(&present), 50.0);
                let deviations: Vec<f64> = present.iter().map(|x| (x - median).abs()).collect();
                let mad = StatsCalculator::percentile(&StatsCalculator::sorted(&deviations), 50.0);
                let mean_ad = StatsCalculator::mean(&deviations);
                if mad > 0.0 {
                    Box::new(move |x: f64| (MAD_SCALE * (x - median) / mad).abs() > threshold)
                } else if mean_ad > 0.0 {
                    Box::new(move |x: f64| ((x - median) / (MEAN_AD_SCALE * mean_ad)).abs() > threshold)
                } else {
                    Box::new(|_: f64| false)
                }
            }
            OutlierRule::Iqr { factor } => {
                let sorted = StatsCalculator::sorted(&present);
                let q1 = StatsCalculator::percentile(&sorted, 25.0);
                let q3 = StatsCalculator::percentile(&sorted, 75.0);
                let iqr = q3 - q1;
                let (low, high) = (q1 - factor * iqr, q3 + factor * iqr);
                Box::new(move |x: f64| x < low || x > high)
            }
        };

        values
            .iter()
            .map(|v| v.map(|x| score(x)).unwrap_or(false))
            .collect()
    }
}

/// Row index -> columns flagged anomalous in that row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutlierFlags {
    rows: BTreeMap<usize, BTreeSet<String>>,
}

impl OutlierFlags {
    pub(crate) fn insert(&mut self, row: usize, column: &str) {
        self.rows.entry(row).or_default().insert(column.to_string());
    }

    /// Flagged row indices, ascending.
    pub fn rows(&self) -> Vec<usize> {
        self.rows.keys().copied().collect()
    }

    pub fn columns_for(&self, row: usize) -> Option<&BTreeSet<String>> {
        self.rows.get(&row)
    }

    pub fn is_flagged(&self, row: usize, column: &str) -> bool {
        self.rows
            .get(&row)
            .map(|cols| cols.contains(column))
            .unwrap_or(false)
    }

    /// Number of rows flagged in `column`.
    pub fn count_for(&self, column: &str) -> usize {
        self.rows.values().filter(|cols| cols.contains(column)).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&usize, &BTreeSet<String>)> {
        self.rows.iter()
    }

    /// Number of flagged rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    #[test]
    fn test_default_rule_flags_extreme_reading() {
        let flags = OutlierRule::default().flag(&some(&[100.0, 200.0, 9999.0]));
        assert_eq!(flags, vec![false, false, true]);
    }

    #[test]
    fn test_zscore_bounded_on_tiny_samples() {
        // max |z| of n points is sqrt(n - 1)
        let flags = OutlierRule::ZScore { threshold: 3.0 }.flag(&some(&[100.0, 200.0, 9999.0]));
        assert_eq!(flags, vec![false; 3]);
    }

    #[test]
    fn test_zscore_flags_spike() {
        let mut values = vec![10.0; 30];
        values.push(500.0);
        let flags = OutlierRule::ZScore { threshold: 3.0 }.flag(&some(&values));
        assert_eq!(flags.iter().filter(|&&f| f).count(), 1);
        assert!(flags[30]);
    }

    #[test]
    fn test_missing_values_never_flagged() {
        let values = vec![Some(1.0), None, Some(1.0), Some(1.0), Some(50.0)];
        let flags = OutlierRule::default().flag(&values);
        assert!(!flags[1]);
        assert!(flags[4]);
    }

    #[test]
    fn test_constant_column_has_no_outliers() {
        let values = some(&[5.0, 5.0, 5.0, 5.0]);
        for rule in [
            OutlierRule::ZScore { threshold: 3.0 },
            OutlierRule::ModifiedZScore { threshold: 3.0 },
            OutlierRule::Iqr { factor: 1.5 },
        ] {
            assert_eq!(rule.flag(&values), vec![false; 4], "{rule}");
        }
    }

    #[test]
    fn test_iqr_rule() {
        let flags = OutlierRule::Iqr { factor: 1.5 }.flag(&some(&[1.0, 2.0, 3.0, 4.0, 100.0]));
        assert_eq!(flags, vec![false, false, false, false, true]);
    }

    #[test]
    fn test_flags_bookkeeping() {
        let mut flags = OutlierFlags::default();
        flags.insert(4, "GHI");
        flags.insert(4, "DNI");
        flags.insert(1, "GHI");

        assert_eq!(flags.rows(), vec![1, 4]);
        assert_eq!(flags.count_for("GHI"), 2);
        assert!(flags.is_flagged(4, "DNI"));
        assert!(!flags.is_flagged(1, "DNI"));
        let row4: Vec<&str> = flags.columns_for(4).unwrap().iter().map(String::as_str).collect();
        assert_eq!(row4, vec!["DNI", "GHI"]);
        assert!(flags.columns_for(0).is_none());
        assert_eq!(flags.len(), 2);
    }
}
