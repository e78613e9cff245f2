//! Data Analyzer Module
//! Read-only analyses over a [`MeasurementTable`]: descriptive statistics,
//! outliers, correlations and cleaning impact.

use super::{
    CleaningEventComparison, CleaningGroups, CleaningImpact, ColumnImpact, CorrelationMatrix,
    GroupSummary, OutlierFlags, OutlierRule, Profile, StatsCalculator, SummaryStats, TimeSeries,
    WindSamples,
};
use crate::data::columns::{CLEANING, GHI, RH, TAMB, TIMESTAMP, WD, WS};
use crate::data::{CalendarField, MeasurementTable};
use polars::prelude::*;
use std::collections::BTreeMap;
use std::error::Error as StdError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("Column not found: {0}")]
    InvalidColumn(String),
    #[error("Column {0} does not hold datetimes of the needed precision")]
    NotDatetime(String),
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
    #[error("Cleaning step failed: {0}")]
    Step(#[source] Box<dyn StdError + Send + Sync>),
}

/// Analyses over a borrowed table. No operation mutates the table.
pub struct DataAnalyzer<'a> {
    table: &'a MeasurementTable,
}

impl<'a> DataAnalyzer<'a> {
    pub fn new(table: &'a MeasurementTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &MeasurementTable {
        self.table
    }

    fn require<S: AsRef<str>>(&self, columns: &[S]) -> Result<(), AnalyzerError> {
        match columns.iter().find(|c| !self.table.has_column(c.as_ref())) {
            Some(missing) => Err(AnalyzerError::InvalidColumn(missing.as_ref().to_string())),
            None => Ok(()),
        }
    }

    fn column_values(&self, column: &str) -> Result<Vec<Option<f64>>, AnalyzerError> {
        self.require(&[column])?;
        Ok(self.table.values(column)?)
    }

    /// Summary statistics for each requested column.
    pub fn describe<S: AsRef<str>>(
        &self,
        columns: &[S],
    ) -> Result<BTreeMap<String, SummaryStats>, AnalyzerError> {
        self.require(columns)?;
        columns
            .iter()
            .map(|name| {
                let values = self.table.present_values(name.as_ref())?;
                let stats = StatsCalculator::compute_descriptive_stats(&values);
                Ok::<_, AnalyzerError>((name.as_ref().to_string(), stats))
            })
            .collect()
    }

    /// Summary statistics for every numeric column.
    pub fn describe_all(&self) -> Result<BTreeMap<String, SummaryStats>, AnalyzerError> {
        self.describe(&self.table.numeric_columns())
    }

    /// Flag anomalous values of each column under `rule`.
    pub fn detect_outliers<S: AsRef<str>>(
        &self,
        columns: &[S],
        rule: OutlierRule,
    ) -> Result<OutlierFlags, AnalyzerError> {
        self.require(columns)?;
        let mut flags = OutlierFlags::default();
        for name in columns {
            let name = name.as_ref();
            let values = self.table.values(name)?;
            for (row, flagged) in rule.flag(&values).into_iter().enumerate() {
                if flagged {
                    flags.insert(row, name);
                }
            }
            log::debug!("{name}: {} outliers ({rule})", flags.count_for(name));
        }
        Ok(flags)
    }

    /// Number of flagged values per column.
    pub fn outlier_counts<S: AsRef<str>>(
        &self,
        columns: &[S],
        rule: OutlierRule,
    ) -> Result<BTreeMap<String, usize>, AnalyzerError> {
        let flags = self.detect_outliers(columns, rule)?;
        Ok(columns
            .iter()
            .map(|c| (c.as_ref().to_string(), flags.count_for(c.as_ref())))
            .collect())
    }

    /// Pearson correlation between every pair of columns, using the rows
    /// where both values are present.
    pub fn correlations<S: AsRef<str>>(
        &self,
        columns: &[S],
    ) -> Result<CorrelationMatrix, AnalyzerError> {
        self.require(columns)?;
        let data: Vec<Vec<Option<f64>>> = columns
            .iter()
            .map(|c| self.table.values(c.as_ref()))
            .collect::<PolarsResult<_>>()?;

        let n = columns.len();
        let mut values = vec![vec![1.0; n]; n];
        for i in 0..n {
            for j in (i + 1)..n {
                let pairs: Vec<(f64, f64)> = data[i]
                    .iter()
                    .zip(&data[j])
                    .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
                    .collect();
                let r = StatsCalculator::pearson(&pairs);
                values[i][j] = r;
                values[j][i] = r;
            }
        }

        Ok(CorrelationMatrix {
            columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
            values,
        })
    }

    /// Compare statistics before and after a caller-supplied cleaning step.
    ///
    /// The step receives the table and returns a new one; the analyzed
    /// table itself is not modified.
    pub fn cleaning_impact<S, F, E>(
        &self,
        columns: &[S],
        step: F,
    ) -> Result<CleaningImpact, AnalyzerError>
    where
        S: AsRef<str>,
        F: FnOnce(&MeasurementTable) -> Result<MeasurementTable, E>,
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        let before = self.describe(columns)?;
        let cleaned = step(self.table).map_err(|e| AnalyzerError::Step(e.into()))?;
        let mut after = DataAnalyzer::new(&cleaned).describe(columns)?;

        let columns = before
            .into_iter()
            .map(|(name, before)| {
                let after = after.remove(&name).unwrap_or_default();
                let delta = before.delta(&after);
                (
                    name,
                    ColumnImpact {
                        before,
                        after,
                        delta,
                    },
                )
            })
            .collect();

        Ok(CleaningImpact {
            rows_before: self.table.height(),
            rows_after: cleaned.height(),
            columns,
        })
    }

    /// Split module readings by the `Cleaning` flag and test whether the
    /// groups differ.
    pub fn cleaning_event_comparison<S: AsRef<str>>(
        &self,
        module_columns: &[S],
    ) -> Result<CleaningEventComparison, AnalyzerError> {
        let flags = self.column_values(CLEANING)?;
        self.require(module_columns)?;

        let mut columns = BTreeMap::new();
        for name in module_columns {
            let values = self.table.values(name.as_ref())?;

            let mut by_flag: BTreeMap<i64, Vec<f64>> = BTreeMap::new();
            for (flag, value) in flags.iter().zip(&values) {
                if let (Some(flag), Some(value)) = (flag, value) {
                    by_flag.entry(flag.round() as i64).or_default().push(*value);
                }
            }

            let groups = by_flag
                .iter()
                .map(|(&flag, values)| {
                    let stats = StatsCalculator::compute_descriptive_stats(values);
                    (
                        flag,
                        GroupSummary {
                            count: stats.count,
                            mean: stats.mean,
                            std: stats.std,
                        },
                    )
                })
                .collect();

            let (p_value, is_significant) = match by_flag.values().collect::<Vec<_>>()[..] {
                [without, with] => {
                    let (p, significant) = StatsCalculator::perform_ttest(with, without);
                    (Some(p), significant)
                }
                _ => (None, false),
            };

            columns.insert(
                name.as_ref().to_string(),
                CleaningGroups {
                    groups,
                    p_value,
                    is_significant,
                },
            );
        }

        Ok(CleaningEventComparison { columns })
    }

    /// Columns aligned on the timestamp column.
    pub fn time_series<S: AsRef<str>>(&self, columns: &[S]) -> Result<TimeSeries, AnalyzerError> {
        self.require(&[TIMESTAMP])?;
        self.require(columns)?;

        let series = columns
            .iter()
            .map(|c| Ok((c.as_ref().to_string(), self.table.values(c.as_ref())?)))
            .collect::<Result<BTreeMap<_, _>, AnalyzerError>>()?;

        Ok(TimeSeries {
            timestamps: self.table.timestamps()?,
            series,
        })
    }

    /// Wind direction and speed pairs for a wind rose.
    pub fn wind(&self) -> Result<WindSamples, AnalyzerError> {
        let direction = self.column_values(WD)?;
        let speed = self.column_values(WS)?;

        let mut samples = WindSamples::default();
        for (d, s) in direction.into_iter().zip(speed) {
            if let (Some(d), Some(s)) = (d, s) {
                samples.direction.push(d);
                samples.speed.push(s);
            }
        }
        Ok(samples)
    }

    /// Temperature, GHI and humidity columns.
    pub fn temperature_humidity(&self) -> Result<MeasurementTable, AnalyzerError> {
        self.require(&[TAMB, GHI, RH])?;
        let df = self.table.dataframe().select([TAMB, GHI, RH])?;
        Ok(MeasurementTable::from_dataframe(df))
    }

    /// Mean of `column` for each hour of the day.
    pub fn hourly_profile(&self, column: &str) -> Result<Profile, AnalyzerError> {
        self.profile(column, CalendarField::Hour)
    }

    /// Mean of `column` for each month.
    pub fn monthly_profile(&self, column: &str) -> Result<Profile, AnalyzerError> {
        self.profile(column, CalendarField::Month)
    }

    fn profile(&self, column: &str, field: CalendarField) -> Result<Profile, AnalyzerError> {
        self.require(&[TIMESTAMP, column])?;
        if !self.table.supports_calendar_field(field) {
            return Err(AnalyzerError::NotDatetime(TIMESTAMP.to_string()));
        }

        let buckets = self.table.calendar_field(field)?;
        let values = self.table.values(column)?;

        let mut sums: BTreeMap<i32, (f64, usize)> = BTreeMap::new();
        for (bucket, value) in buckets.into_iter().zip(values) {
            if let (Some(bucket), Some(value)) = (bucket, value) {
                let entry = sums.entry(bucket).or_insert((0.0, 0));
                entry.0 += value;
                entry.1 += 1;
            }
        }

        Ok(Profile {
            column: column.to_string(),
            points: sums
                .into_iter()
                .map(|(bucket, (sum, count))| (bucket, sum / count as f64))
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{CleaningOptions, DataCleaner, DataLoader};
    use std::io::Write;

    fn table(df: DataFrame) -> MeasurementTable {
        MeasurementTable::from_dataframe(df)
    }

    fn solar_table() -> MeasurementTable {
        table(
            df!(
                "GHI" => [0.0, 120.0, 450.0, 800.0, 620.0, 90.0],
                "DNI" => [0.0, 80.0, 300.0, 690.0, 500.0, 40.0],
                "Tamb" => [22.0, 24.0, 27.0, 31.0, 30.0, 25.0],
                "RH" => [Some(90.0), Some(85.0), None, Some(60.0), Some(65.0), Some(80.0)]
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_describe_mean_within_range() {
        let t = solar_table();
        let stats = DataAnalyzer::new(&t).describe_all().unwrap();

        assert_eq!(stats.len(), 4);
        for (name, s) in &stats {
            assert!(s.min <= s.mean && s.mean <= s.max, "{name}");
        }
        assert_eq!(stats["RH"].count, 5);
    }

    #[test]
    fn test_describe_unknown_column() {
        let t = solar_table();
        let err = DataAnalyzer::new(&t).describe(&["GHI", "WS"]).unwrap_err();
        assert!(matches!(err, AnalyzerError::InvalidColumn(c) if c == "WS"));
    }

    #[test]
    fn test_outliers_from_csv() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"GHI\n100\n200\n9999\n").unwrap();
        let t = DataLoader::new(file.path()).load().unwrap();

        let flags = DataAnalyzer::new(&t)
            .detect_outliers(&["GHI"], OutlierRule::default())
            .unwrap();
        assert_eq!(flags.rows(), vec![2]);
    }

    #[test]
    fn test_outlier_detection_is_idempotent() {
        let t = solar_table();
        let analyzer = DataAnalyzer::new(&t);
        let columns = t.numeric_columns();
        let rule = OutlierRule::Iqr { factor: 0.5 };

        let first = analyzer.detect_outliers(&columns, rule).unwrap();
        let second = analyzer.detect_outliers(&columns, rule).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_outlier_counts() {
        let t = table(df!("WS" => [1.0, 1.2, 0.9, 1.1, 1.0, 25.0]).unwrap());
        let counts = DataAnalyzer::new(&t)
            .outlier_counts(&["WS"], OutlierRule::default())
            .unwrap();
        assert_eq!(counts["WS"], 1);
    }

    #[test]
    fn test_correlation_matrix_shape() {
        let t = solar_table();
        let matrix = DataAnalyzer::new(&t)
            .correlations(&["GHI", "DNI", "Tamb", "RH"])
            .unwrap();

        assert_eq!(matrix.len(), 4);
        assert!(matrix.is_symmetric());
        for i in 0..matrix.len() {
            assert_eq!(matrix.values[i][i], 1.0);
        }
        assert!(matrix.get("GHI", "DNI").unwrap() > 0.9);
        assert!(matrix.get("Tamb", "RH").unwrap() < 0.0);
    }

    #[test]
    fn test_cleaning_impact_identity_is_zero() {
        let t = solar_table();
        let impact = DataAnalyzer::new(&t)
            .cleaning_impact(&["GHI", "RH"], |t| Ok::<_, PolarsError>(t.clone()))
            .unwrap();

        assert!(impact.is_zero());
        assert_eq!(impact.rows_removed(), 0);
    }

    #[test]
    fn test_cleaning_impact_with_filter() {
        let t = solar_table();
        let impact = DataAnalyzer::new(&t)
            .cleaning_impact(&["GHI"], |t| t.filter_rows(col("GHI").gt(lit(100.0))))
            .unwrap();

        assert_eq!(impact.rows_removed(), 2);
        let ghi = &impact.columns["GHI"];
        assert_eq!(ghi.delta.count, -2);
        assert_eq!(ghi.delta.min, 120.0);
        assert!(!impact.is_zero());
        // analyzed table is untouched
        assert_eq!(t.height(), 6);
    }

    #[test]
    fn test_cleaning_impact_with_cleaner() {
        let t = table(df!("GHI" => [Some(-3.0), Some(10.0), None], "DNI" => [Some(1.0), Some(2.0), None], "DHI" => [Some(1.0), Some(1.0), None]).unwrap());
        let impact = DataAnalyzer::new(&t)
            .cleaning_impact(&["GHI"], |t| {
                DataCleaner::clean(t, "Benin", &CleaningOptions::default())
            })
            .unwrap();

        assert_eq!(impact.rows_removed(), 1);
        assert_eq!(impact.columns["GHI"].after.min, 0.0);
    }

    #[test]
    fn test_cleaning_event_comparison() {
        let t = table(
            df!(
                "Cleaning" => [0, 0, 0, 0, 1, 1, 1, 1],
                "ModA" => [200.0, 205.0, 198.0, 202.0, 260.0, 255.0, 262.0, 258.0]
            )
            .unwrap(),
        );
        let comparison = DataAnalyzer::new(&t)
            .cleaning_event_comparison(&["ModA"])
            .unwrap();

        let moda = &comparison.columns["ModA"];
        assert_eq!(moda.groups.len(), 2);
        assert_eq!(moda.groups[&0].count, 4);
        assert!(moda.groups[&1].mean > moda.groups[&0].mean);
        assert!(moda.is_significant);
    }

    #[test]
    fn test_cleaning_event_requires_flag_column() {
        let t = solar_table();
        let err = DataAnalyzer::new(&t)
            .cleaning_event_comparison(&["GHI"])
            .unwrap_err();
        assert!(matches!(err, AnalyzerError::InvalidColumn(c) if c == "Cleaning"));
    }

    #[test]
    fn test_wind_pairs_skip_missing() {
        let t = table(
            df!(
                "WS" => [Some(1.0), None, Some(3.0)],
                "WD" => [Some(90.0), Some(180.0), Some(270.0)]
            )
            .unwrap(),
        );
        let wind = DataAnalyzer::new(&t).wind().unwrap();
        assert_eq!(wind.speed, vec![1.0, 3.0]);
        assert_eq!(wind.direction, vec![90.0, 270.0]);
    }

    #[test]
    fn test_temperature_humidity_subset() {
        let t = solar_table();
        let subset = DataAnalyzer::new(&t).temperature_humidity().unwrap();
        assert_eq!(subset.columns(), vec!["Tamb", "GHI", "RH"]);
    }

    #[test]
    fn test_time_series_requires_timestamp() {
        let t = solar_table();
        let err = DataAnalyzer::new(&t).time_series(&["GHI"]).unwrap_err();
        assert!(matches!(err, AnalyzerError::InvalidColumn(c) if c == "Timestamp"));
    }

    #[test]
    fn test_hourly_profile() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            b"Timestamp,GHI\n\
              2021-08-09 10:00:00,400\n\
              2021-08-09 10:30:00,600\n\
              2021-08-09 12:00:00,900\n",
        )
        .unwrap();
        let t = DataLoader::new(file.path()).load().unwrap();

        let profile = DataAnalyzer::new(&t).hourly_profile("GHI").unwrap();
        assert_eq!(profile.points, vec![(10, 500.0), (12, 900.0)]);

        let series = DataAnalyzer::new(&t).time_series(&["GHI"]).unwrap();
        assert_eq!(series.timestamps.len(), 3);
        assert_eq!(series.series["GHI"].len(), 3);
    }

    #[test]
    fn test_date_only_timestamps_give_monthly_but_not_hourly_profile() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"Timestamp,GHI\n2021-08-09,1\n2021-08-10,3\n2021-09-01,5\n")
            .unwrap();
        let t = DataLoader::new(file.path()).load().unwrap();
        let analyzer = DataAnalyzer::new(&t);

        let err = analyzer.hourly_profile("GHI").unwrap_err();
        assert!(matches!(err, AnalyzerError::NotDatetime(c) if c == "Timestamp"));

        let monthly = analyzer.monthly_profile("GHI").unwrap();
        assert_eq!(monthly.points, vec![(8, 2.0), (9, 5.0)]);
    }
}
