//! Statistics Calculator Module
//! Descriptive statistics, Welch's t-test and Pearson correlation over plain
//! slices of values.

use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Significance threshold for t-test
pub const SIGNIFICANCE_THRESHOLD: f64 = 0.05;

/// Descriptive statistics for one column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummaryStats {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

impl Default for SummaryStats {
    fn default() -> Self {
        Self {
            count: 0,
            mean: f64::NAN,
            std: f64::NAN,
            min: f64::NAN,
            q25: f64::NAN,
            median: f64::NAN,
            q75: f64::NAN,
            max: f64::NAN,
        }
    }
}

impl SummaryStats {
    /// Field-wise `after - self`.
    pub fn delta(&self, after: &SummaryStats) -> StatsDelta {
        StatsDelta {
            count: after.count as i64 - self.count as i64,
            mean: diff(self.mean, after.mean),
            std: diff(self.std, after.std),
            min: diff(self.min, after.min),
            q25: diff(self.q25, after.q25),
            median: diff(self.median, after.median),
            q75: diff(self.q75, after.q75),
            max: diff(self.max, after.max),
        }
    }
}

// Undefined on both sides counts as unchanged.
fn diff(before: f64, after: f64) -> f64 {
    if before.is_nan() && after.is_nan() {
        0.0
    } else {
        after - before
    }
}

/// Change of every [`SummaryStats`] field across a cleaning step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatsDelta {
    pub count: i64,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

impl StatsDelta {
    pub fn is_zero(&self) -> bool {
        self.count == 0
            && [
                self.mean,
                self.std,
                self.min,
                self.q25,
                self.median,
                self.q75,
                self.max,
            ]
            .iter()
            .all(|&d| d == 0.0)
    }
}

/// Handles statistical calculations.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Compute descriptive statistics for an array of values.
    /// NaN entries are ignored.
    pub fn compute_descriptive_stats(values: &[f64]) -> SummaryStats {
        let values: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        let n = values.len();
        if n == 0 {
            return SummaryStats::default();
        }

        let sorted = Self::sorted(&values);
        let min = sorted[0];
        let max = sorted[n - 1];

        // summation error can push the mean of identical values past them
        let mean = Self::mean(&values).clamp(min, max);

        let variance = Self::sample_variance(&values, mean);

        SummaryStats {
            count: n,
            mean,
            std: variance.sqrt(),
            min,
            q25: Self::percentile(&sorted, 25.0),
            median: Self::percentile(&sorted, 50.0),
            q75: Self::percentile(&sorted, 75.0),
            max,
        }
    }

    pub fn sorted(values: &[f64]) -> Vec<f64> {
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        sorted
    }

    pub fn mean(values: &[f64]) -> f64 {
        if values.is_empty() {
            return f64::NAN;
        }
        values.iter().sum::<f64>() / values.len() as f64
    }

    /// Standard deviation with `ddof = 0`.
    pub fn population_std(values: &[f64]) -> f64 {
        if values.is_empty() {
            return f64::NAN;
        }
        let mean = Self::mean(values);
        (values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / values.len() as f64).sqrt()
    }

    /// Sum of squared deviations over `n - 1`; zero for fewer than two values.
    pub fn sample_variance(values: &[f64], mean: f64) -> f64 {
        if values.len() < 2 {
            return 0.0;
        }
        values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64
    }

    /// Linearly interpolated percentile of already sorted values, `p` in 0..=100.
    pub fn percentile(sorted_values: &[f64], p: f64) -> f64 {
        let Some(last) = sorted_values.len().checked_sub(1) else {
            return f64::NAN;
        };
        let position = (p / 100.0).clamp(0.0, 1.0) * last as f64;
        let below = position.floor() as usize;
        let weight = position - below as f64;
        if weight == 0.0 {
            return sorted_values[below];
        }
        let above = (below + 1).min(last);
        sorted_values[below] + (sorted_values[above] - sorted_values[below]) * weight
    }

    /// Welch's t-test between two independent samples.
    ///
    /// Returns the two-sided p-value and whether it is within
    /// [`SIGNIFICANCE_THRESHOLD`]. Samples of fewer than two values give NaN.
    pub fn perform_ttest(group_values: &[f64], control_values: &[f64]) -> (f64, bool) {
        if group_values.len() < 2 || control_values.len() < 2 {
            return (f64::NAN, false);
        }

        // mean and squared standard error of the mean
        let moments = |values: &[f64]| {
            let mean = Self::mean(values);
            (mean, Self::sample_variance(values, mean) / values.len() as f64)
        };
        let (group_mean, group_se2) = moments(group_values);
        let (control_mean, control_se2) = moments(control_values);

        let se2 = group_se2 + control_se2;
        if se2 == 0.0 {
            return (1.0, false);
        }
        let t = (group_mean - control_mean) / se2.sqrt();

        // Welch-Satterthwaite
        let dof = se2.powi(2)
            / (group_se2.powi(2) / (group_values.len() - 1) as f64
                + control_se2.powi(2) / (control_values.len() - 1) as f64);

        match StudentsT::new(0.0, 1.0, dof) {
            Ok(dist) => {
                let p_value = 2.0 * dist.sf(t.abs());
                (p_value, p_value <= SIGNIFICANCE_THRESHOLD)
            }
            Err(_) => (f64::NAN, false),
        }
    }

    /// Pearson correlation of paired observations. NaN when undefined.
    pub fn pearson(pairs: &[(f64, f64)]) -> f64 {
        let n = pairs.len();
        if n < 2 {
            return f64::NAN;
        }

        let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n as f64;
        let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n as f64;

        let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
        for &(x, y) in pairs {
            let dx = x - mean_x;
            let dy = y - mean_y;
            sxy += dx * dy;
            sxx += dx * dx;
            syy += dy * dy;
        }

        if sxx == 0.0 || syy == 0.0 {
            return f64::NAN;
        }
        (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
    }
}
