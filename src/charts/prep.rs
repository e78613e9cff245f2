//! Chart data preparation.
//! Pure functions turning analysis results into the shapes the renderers
//! draw: box summaries, wind-rose bins, heatmap cells and line segments.

use crate::stats::{CorrelationMatrix, StatsCalculator, WindSamples};

/// Whiskers reach the furthest value within this many IQRs of the box.
pub const WHISKER_FACTOR: f64 = 1.5;

pub const WIND_SECTORS: usize = 16;

/// Lower edges of the wind speed bins in m/s. The last bin is open-ended.
pub const SPEED_BIN_EDGES: [f64; 5] = [0.0, 2.0, 4.0, 6.0, 8.0];
pub const SPEED_BINS: usize = SPEED_BIN_EDGES.len();

pub const SECTOR_LABELS: [&str; WIND_SECTORS] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

/// Five-number summary plus the points beyond the whiskers.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxSummary {
    pub label: String,
    pub count: usize,
    pub whisker_low: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub whisker_high: f64,
    pub mean: f64,
    pub outliers: Vec<f64>,
}

impl BoxSummary {
    /// `None` when no finite value is present.
    pub fn from_values(label: impl Into<String>, values: &[f64]) -> Option<Self> {
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if finite.is_empty() {
            return None;
        }

        let sorted = StatsCalculator::sorted(&finite);
        let q1 = StatsCalculator::percentile(&sorted, 25.0);
        let median = StatsCalculator::percentile(&sorted, 50.0);
        let q3 = StatsCalculator::percentile(&sorted, 75.0);
        let iqr = q3 - q1;
        let (low_fence, high_fence) = (q1 - WHISKER_FACTOR * iqr, q3 + WHISKER_FACTOR * iqr);

        let whisker_low = sorted
            .iter()
            .copied()
            .find(|&v| v >= low_fence)
            .unwrap_or(q1);
        let whisker_high = sorted
            .iter()
            .rev()
            .copied()
            .find(|&v| v <= high_fence)
            .unwrap_or(q3);

        let outliers = sorted
            .iter()
            .copied()
            .filter(|&v| v < whisker_low || v > whisker_high)
            .collect();

        Some(Self {
            label: label.into(),
            count: sorted.len(),
            whisker_low,
            q1,
            median,
            q3,
            whisker_high,
            mean: StatsCalculator::mean(&sorted),
            outliers,
        })
    }

    /// Smallest and largest value drawn, outliers included.
    pub fn extent(&self) -> (f64, f64) {
        let low = self.outliers.first().copied().unwrap_or(self.whisker_low);
        let high = self.outliers.last().copied().unwrap_or(self.whisker_high);
        (low.min(self.whisker_low), high.max(self.whisker_high))
    }
}

/// Wind observations counted per direction sector and speed bin.
#[derive(Debug, Clone, PartialEq)]
pub struct WindRose {
    /// `counts[sector][bin]`, sector 0 centred on north
    pub counts: Vec<[usize; SPEED_BINS]>,
    pub total: usize,
}

impl WindRose {
    pub fn from_samples(samples: &WindSamples) -> Self {
        let mut counts = vec![[0usize; SPEED_BINS]; WIND_SECTORS];
        let mut total = 0;
        for (&direction, &speed) in samples.direction.iter().zip(&samples.speed) {
            if !direction.is_finite() || !speed.is_finite() {
                continue;
            }
            counts[Self::sector_of(direction)][Self::speed_bin(speed)] += 1;
            total += 1;
        }
        Self { counts, total }
    }

    pub fn sector_width() -> f64 {
        360.0 / WIND_SECTORS as f64
    }

    /// Sector index for a direction in degrees, sectors centred on their
    /// compass point.
    pub fn sector_of(direction: f64) -> usize {
        let degrees = direction.rem_euclid(360.0);
        ((degrees / Self::sector_width() + 0.5).floor() as usize) % WIND_SECTORS
    }

    pub fn speed_bin(speed: f64) -> usize {
        SPEED_BIN_EDGES
            .iter()
            .rposition(|&edge| speed >= edge)
            .unwrap_or(0)
    }

    pub fn speed_label(bin: usize) -> String {
        match SPEED_BIN_EDGES.get(bin + 1) {
            Some(upper) => format!("{}-{} m/s", SPEED_BIN_EDGES[bin], upper),
            None => format!(">{} m/s", SPEED_BIN_EDGES[SPEED_BINS - 1]),
        }
    }

    /// Share of all observations in `(sector, bin)`, in percent.
    pub fn frequency(&self, sector: usize, bin: usize) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.counts[sector][bin] as f64 / self.total as f64 * 100.0
    }

    /// Share of all observations in `sector`, in percent.
    pub fn sector_frequency(&self, sector: usize) -> f64 {
        (0..SPEED_BINS).map(|bin| self.frequency(sector, bin)).sum()
    }

    pub fn max_sector_frequency(&self) -> f64 {
        (0..WIND_SECTORS)
            .map(|s| self.sector_frequency(s))
            .fold(0.0, f64::max)
    }
}

/// One coloured cell of a correlation heatmap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatmapCell {
    pub row: usize,
    pub col: usize,
    pub value: f64,
    pub color: (u8, u8, u8),
}

pub fn heatmap_cells(matrix: &CorrelationMatrix) -> Vec<HeatmapCell> {
    let n = matrix.len();
    (0..n)
        .flat_map(|row| (0..n).map(move |col| (row, col)))
        .map(|(row, col)| {
            let value = matrix.values[row][col];
            HeatmapCell {
                row,
                col,
                value,
                color: diverging_color(value),
            }
        })
        .collect()
}

const RED: (u8, u8, u8) = (178, 24, 43);
const NEUTRAL: (u8, u8, u8) = (247, 247, 247);
const BLUE: (u8, u8, u8) = (33, 102, 172);
const UNDEFINED: (u8, u8, u8) = (200, 200, 200);

/// Red-white-blue scale over [-1, 1]. NaN maps to grey.
pub fn diverging_color(value: f64) -> (u8, u8, u8) {
    if value.is_nan() {
        return UNDEFINED;
    }
    let v = value.clamp(-1.0, 1.0);
    if v < 0.0 {
        lerp(NEUTRAL, RED, -v)
    } else {
        lerp(NEUTRAL, BLUE, v)
    }
}

fn lerp(from: (u8, u8, u8), to: (u8, u8, u8), t: f64) -> (u8, u8, u8) {
    let channel = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
    (
        channel(from.0, to.0),
        channel(from.1, to.1),
        channel(from.2, to.2),
    )
}

/// Runs of consecutive present values, as `(row, value)` points. Gaps in
/// the data break the line instead of being bridged.
pub fn segments(values: &[Option<f64>]) -> Vec<Vec<(usize, f64)>> {
    let mut out = Vec::new();
    let mut current = Vec::new();
    for (row, value) in values.iter().enumerate() {
        match value {
            Some(v) => current.push((row, *v)),
            None if !current.is_empty() => out.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// Axis range covering `values` with 5% padding. `None` for no finite value.
pub fn value_range(values: impl IntoIterator<Item = f64>) -> Option<(f64, f64)> {
    let (min, max) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            None => Some((v, v)),
        })?;

    let pad = if max > min {
        (max - min) * 0.05
    } else {
        min.abs().max(1.0) * 0.05
    };
    Some((min - pad, max + pad))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_summary_whiskers_and_outliers() {
        let summary =
            BoxSummary::from_values("Benin", &[1.0, 2.0, 3.0, 4.0, 5.0, 100.0]).unwrap();

        assert_eq!(summary.count, 6);
        assert_eq!(summary.q1, 2.25);
        assert_eq!(summary.median, 3.5);
        assert_eq!(summary.q3, 4.75);
        assert_eq!(summary.whisker_low, 1.0);
        assert_eq!(summary.whisker_high, 5.0);
        assert_eq!(summary.outliers, vec![100.0]);
        assert_eq!(summary.extent(), (1.0, 100.0));
    }

    #[test]
    fn test_box_summary_empty() {
        assert!(BoxSummary::from_values("Togo", &[]).is_none());
        assert!(BoxSummary::from_values("Togo", &[f64::NAN]).is_none());
    }

    #[test]
    fn test_sector_of_wraps_around_north() {
        assert_eq!(WindRose::sector_of(0.0), 0);
        assert_eq!(WindRose::sector_of(355.0), 0);
        assert_eq!(WindRose::sector_of(11.0), 0);
        assert_eq!(WindRose::sector_of(12.0), 1);
        assert_eq!(WindRose::sector_of(90.0), 4);
        assert_eq!(WindRose::sector_of(-90.0), 12);
        assert_eq!(SECTOR_LABELS[WindRose::sector_of(225.0)], "SW");
    }

    #[test]
    fn test_speed_bins() {
        assert_eq!(WindRose::speed_bin(0.0), 0);
        assert_eq!(WindRose::speed_bin(1.9), 0);
        assert_eq!(WindRose::speed_bin(2.0), 1);
        assert_eq!(WindRose::speed_bin(25.0), SPEED_BINS - 1);
        assert_eq!(WindRose::speed_label(0), "0-2 m/s");
        assert_eq!(WindRose::speed_label(SPEED_BINS - 1), ">8 m/s");
    }

    #[test]
    fn test_wind_rose_frequencies_sum_to_100() {
        let samples = WindSamples {
            direction: vec![0.0, 90.0, 90.0, 180.0, f64::NAN],
            speed: vec![1.0, 3.0, 9.0, 5.0, 2.0],
        };
        let rose = WindRose::from_samples(&samples);

        assert_eq!(rose.total, 4);
        assert_eq!(rose.counts[4][1], 1);
        assert_eq!(rose.counts[4][4], 1);
        assert_eq!(rose.sector_frequency(4), 50.0);
        assert_eq!(rose.max_sector_frequency(), 50.0);
        let total: f64 = (0..WIND_SECTORS).map(|s| rose.sector_frequency(s)).sum();
        assert!((total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_heatmap_colors() {
        assert_eq!(diverging_color(-1.0), RED);
        assert_eq!(diverging_color(0.0), NEUTRAL);
        assert_eq!(diverging_color(1.0), BLUE);
        assert_eq!(diverging_color(f64::NAN), UNDEFINED);

        let matrix = CorrelationMatrix {
            columns: vec!["GHI".into(), "Tamb".into()],
            values: vec![vec![1.0, -0.5], vec![-0.5, 1.0]],
        };
        let cells = heatmap_cells(&matrix);
        assert_eq!(cells.len(), 4);
        assert_eq!(cells[1].row, 0);
        assert_eq!(cells[1].col, 1);
        assert_eq!(cells[1].color, cells[2].color);
    }

    #[test]
    fn test_segments_split_on_gaps() {
        let values = [None, Some(1.0), Some(2.0), None, None, Some(5.0)];
        assert_eq!(
            segments(&values),
            vec![vec![(1, 1.0), (2, 2.0)], vec![(5, 5.0)]]
        );
        assert!(segments(&[None, None]).is_empty());
    }

    #[test]
    fn test_value_range_padding() {
        let (lo, hi) = value_range([0.0, 100.0]).unwrap();
        assert!((lo + 5.0).abs() < 1e-9 && (hi - 105.0).abs() < 1e-9);
        assert_eq!(value_range([f64::NAN]), None);
        let (lo, hi) = value_range([3.0]).unwrap();
        assert!(lo < 3.0 && hi > 3.0);
    }
}
