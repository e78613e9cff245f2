//! Data Processor Module
//! Handles cleaning (clipping, missing-value handling) and validation of
//! measurement tables.

use super::columns::{COUNTRY, IRRADIANCE};
use super::MeasurementTable;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// How missing numeric values are handled after clipping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputeStrategy {
    /// Leave nulls in place
    #[default]
    None,
    /// Drop every row with a null in any numeric column
    Drop,
    Mean,
    Median,
    Zero,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningOptions {
    pub clip_negative_irradiance: bool,
    pub drop_empty_irradiance: bool,
    pub impute: ImputeStrategy,
}

impl Default for CleaningOptions {
    fn default() -> Self {
        Self {
            clip_negative_irradiance: true,
            drop_empty_irradiance: true,
            impute: ImputeStrategy::None,
        }
    }
}

/// Outcome of [`DataCleaner::validate`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub label: String,
    pub missing_columns: Vec<String>,
    pub negative_values: BTreeMap<String, usize>,
    pub missing_values: BTreeMap<String, usize>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.missing_columns.is_empty()
            && self.negative_values.values().all(|&n| n == 0)
            && self.missing_values.values().all(|&n| n == 0)
    }
}

/// Handles data cleaning operations.
pub struct DataCleaner;

impl DataCleaner {
    /// Clean a raw table and tag it with `country`.
    ///
    /// Negative irradiance is clipped to zero, rows with no irradiance
    /// reading at all are dropped, then `options.impute` is applied to the
    /// numeric columns. The input table is left untouched.
    pub fn clean(
        table: &MeasurementTable,
        country: &str,
        options: &CleaningOptions,
    ) -> Result<MeasurementTable, ProcessorError> {
        let irradiance: Vec<&str> = IRRADIANCE
            .iter()
            .copied()
            .filter(|c| table.has_column(c))
            .collect();
        let numeric = table.numeric_columns();

        let mut lf = table.dataframe().clone().lazy();

        if options.clip_negative_irradiance && !irradiance.is_empty() {
            let clipped: Vec<Expr> = irradiance
                .iter()
                .map(|name| {
                    let value = col(*name).cast(DataType::Float64);
                    when(value.clone().lt(lit(0.0)))
                        .then(lit(0.0))
                        .otherwise(value)
                        .alias(*name)
                })
                .collect();
            lf = lf.with_columns(clipped);
        }

        // Rows are only judged empty when every irradiance column exists.
        if options.drop_empty_irradiance && irradiance.len() == IRRADIANCE.len() {
            let any_reading = irradiance
                .iter()
                .map(|name| col(*name).is_not_null())
                .reduce(|a, b| a.or(b));
            if let Some(keep) = any_reading {
                lf = lf.filter(keep);
            }
        }

        lf = Self::impute(lf, &numeric, options.impute);
        lf = lf.with_column(lit(country).alias(COUNTRY));

        let df = lf.collect()?;
        log::info!(
            "Cleaned {} data: {} -> {} rows (impute: {:?})",
            country,
            table.height(),
            df.height(),
            options.impute
        );
        Ok(MeasurementTable::from_dataframe(df))
    }

    fn impute(lf: LazyFrame, numeric: &[String], strategy: ImputeStrategy) -> LazyFrame {
        if numeric.is_empty() {
            return lf;
        }

        let fill = |value: fn(Expr) -> Expr| -> Vec<Expr> {
            numeric
                .iter()
                .map(|name| {
                    col(name.as_str())
                        .fill_null(value(col(name.as_str())))
                        .alias(name.as_str())
                })
                .collect()
        };

        match strategy {
            ImputeStrategy::None => lf,
            ImputeStrategy::Drop => {
                let complete = numeric
                    .iter()
                    .map(|name| col(name.as_str()).is_not_null())
                    .reduce(|a, b| a.and(b));
                match complete {
                    Some(keep) => lf.filter(keep),
                    None => lf,
                }
            }
            ImputeStrategy::Mean => lf.with_columns(fill(|e| e.mean())),
            ImputeStrategy::Median => lf.with_columns(fill(|e| e.median())),
            ImputeStrategy::Zero => lf.with_columns(fill(|_| lit(0.0))),
        }
    }

    /// Check that irradiance columns exist, are non-negative and complete.
    pub fn validate(
        table: &MeasurementTable,
        label: &str,
    ) -> Result<ValidationReport, ProcessorError> {
        let mut report = ValidationReport {
            label: label.to_string(),
            ..Default::default()
        };

        for name in IRRADIANCE {
            if !table.has_column(name) {
                log::warn!("{label}: missing required column {name}");
                report.missing_columns.push(name.to_string());
                continue;
            }

            let values = table.values(name)?;
            let missing = values.iter().filter(|v| v.is_none()).count();
            let negative = values.iter().flatten().filter(|&&v| v < 0.0).count();

            if missing > 0 {
                log::warn!("{label}: {missing} missing values in {name}");
            }
            if negative > 0 {
                log::warn!("{label}: {negative} negative values in {name}");
            }
            report.missing_values.insert(name.to_string(), missing);
            report.negative_values.insert(name.to_string(), negative);
        }

        Ok(report)
    }
}

/// Write a table to `path` as CSV with a header row.
pub fn write_csv(table: &MeasurementTable, path: &Path) -> Result<(), ProcessorError> {
    let mut file = File::create(path).map_err(|source| ProcessorError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut df = table.dataframe().clone();
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)?;
    log::info!("Saved {} rows to {}", df.height(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataLoader;

    fn raw_table() -> MeasurementTable {
        let df = df!(
            "GHI" => [Some(-5.0), Some(100.0), None, Some(300.0)],
            "DNI" => [Some(10.0), Some(-1.0), None, None],
            "DHI" => [Some(2.0), Some(3.0), None, Some(4.0)],
            "Tamb" => [Some(25.0), None, Some(27.0), Some(29.0)]
        )
        .unwrap();
        MeasurementTable::from_dataframe(df)
    }

    #[test]
    fn test_clean_clips_and_drops_empty_rows() {
        let table = raw_table();
        let cleaned = DataCleaner::clean(&table, "Benin", &CleaningOptions::default()).unwrap();

        // row 2 has no irradiance reading at all
        assert_eq!(cleaned.height(), 3);
        assert_eq!(
            cleaned.values("GHI").unwrap(),
            vec![Some(0.0), Some(100.0), Some(300.0)]
        );
        assert_eq!(
            cleaned.values("DNI").unwrap(),
            vec![Some(10.0), Some(0.0), None]
        );
        assert!(cleaned.has_column("Country"));
        // input untouched
        assert_eq!(table.height(), 4);
    }

    #[test]
    fn test_partial_irradiance_keeps_empty_rows() {
        let df = df!(
            "GHI" => [Some(-2.0), None],
            "DNI" => [Some(5.0), None]
        )
        .unwrap();
        let table = MeasurementTable::from_dataframe(df);
        let cleaned = DataCleaner::clean(&table, "Togo", &CleaningOptions::default()).unwrap();

        assert_eq!(cleaned.height(), 2);
        assert_eq!(cleaned.values("GHI").unwrap(), vec![Some(0.0), None]);
    }

    #[test]
    fn test_impute_mean_fills_nulls() {
        let options = CleaningOptions {
            impute: ImputeStrategy::Mean,
            ..Default::default()
        };
        let cleaned = DataCleaner::clean(&raw_table(), "Togo", &options).unwrap();

        let dni = cleaned.values("DNI").unwrap();
        assert!(dni.iter().all(Option::is_some));
        // mean of the clipped values 10 and 0
        assert_eq!(dni[2], Some(5.0));
    }

    #[test]
    fn test_impute_drop_removes_incomplete_rows() {
        let options = CleaningOptions {
            impute: ImputeStrategy::Drop,
            ..Default::default()
        };
        let cleaned = DataCleaner::clean(&raw_table(), "Togo", &options).unwrap();

        assert_eq!(cleaned.height(), 1);
        assert_eq!(cleaned.values("GHI").unwrap(), vec![Some(0.0)]);
    }

    #[test]
    fn test_impute_zero() {
        let options = CleaningOptions {
            impute: ImputeStrategy::Zero,
            ..Default::default()
        };
        let cleaned = DataCleaner::clean(&raw_table(), "Togo", &options).unwrap();
        assert_eq!(
            cleaned.values("Tamb").unwrap(),
            vec![Some(25.0), Some(0.0), Some(29.0)]
        );
    }

    #[test]
    fn test_validate_valid_data() {
        let df = df!(
            "GHI" => [100.0, 200.0, 300.0],
            "DNI" => [150.0, 250.0, 350.0],
            "DHI" => [50.0, 150.0, 250.0]
        )
        .unwrap();
        let report =
            DataCleaner::validate(&MeasurementTable::from_dataframe(df), "Test Country").unwrap();
        assert!(report.is_valid());
    }

    #[test]
    fn test_validate_invalid_data() {
        let df = df!(
            "GHI" => [Some(100.0), Some(-200.0), Some(300.0)],
            "DNI" => [Some(150.0), None, Some(350.0)],
            "DHI" => [Some(50.0), Some(150.0), Some(250.0)]
        )
        .unwrap();
        let report =
            DataCleaner::validate(&MeasurementTable::from_dataframe(df), "Test Country").unwrap();
        assert!(!report.is_valid());
        assert_eq!(report.negative_values["GHI"], 1);
        assert_eq!(report.missing_values["DNI"], 1);
    }

    #[test]
    fn test_validate_missing_columns() {
        let df = df!("DNI" => [1.0], "DHI" => [2.0]).unwrap();
        let report =
            DataCleaner::validate(&MeasurementTable::from_dataframe(df), "Test Country").unwrap();
        assert!(!report.is_valid());
        assert_eq!(report.missing_columns, vec!["GHI".to_string()]);
    }

    #[test]
    fn test_write_csv_then_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("benin_clean.csv");
        let cleaned =
            DataCleaner::clean(&raw_table(), "Benin", &CleaningOptions::default()).unwrap();

        write_csv(&cleaned, &path).unwrap();
        let reloaded = DataLoader::new(&path).load().unwrap();

        assert_eq!(reloaded.height(), cleaned.height());
        assert_eq!(reloaded.columns(), cleaned.columns());
    }
}
