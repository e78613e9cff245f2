//! CSV Data Loader Module
//! Loads measurement CSV files into a [`MeasurementTable`] using Polars.

use super::columns::TIMESTAMP;
use crate::stats::{AnalyzerError, DataAnalyzer, SummaryStats};
use polars::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Cannot read {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed data in {path}: {reason}")]
    Format { path: PathBuf, reason: String },
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

/// Calendar component extracted from the timestamp column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarField {
    Hour,
    Month,
}

/// Per-column entry of a [`DatasetInfo`].
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    pub name: String,
    pub dtype: String,
    pub null_count: usize,
    pub null_percentage: f64,
}

/// Shape, types and missing-value counts of a loaded table.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetInfo {
    pub rows: usize,
    pub columns: Vec<ColumnInfo>,
}

impl DatasetInfo {
    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.columns.len())
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Missing value count per column.
    pub fn missing_values(&self) -> BTreeMap<String, usize> {
        self.columns
            .iter()
            .map(|c| (c.name.clone(), c.null_count))
            .collect()
    }

    pub fn total_missing(&self) -> usize {
        self.columns.iter().map(|c| c.null_count).sum()
    }
}

/// In-memory measurement table.
///
/// The column set is fixed when the table is built. Tables produced by
/// [`DataLoader`] are sorted by their timestamp column when it parses as a
/// datetime.
#[derive(Debug, Clone)]
pub struct MeasurementTable {
    df: DataFrame,
}

impl MeasurementTable {
    pub fn from_dataframe(df: DataFrame) -> Self {
        Self { df }
    }

    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    pub fn columns(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.df
            .get_column_names()
            .iter()
            .any(|c| c.as_str() == name)
    }

    /// Get list of numeric column names.
    pub fn numeric_columns(&self) -> Vec<String> {
        self.df
            .get_columns()
            .iter()
            .filter(|col| is_numeric(col.dtype()))
            .map(|col| col.name().to_string())
            .collect()
    }

    /// Whether the timestamp column exists and holds parsed dates or datetimes.
    pub fn has_datetime_index(&self) -> bool {
        self.df
            .column(TIMESTAMP)
            .map(|c| matches!(c.dtype(), DataType::Datetime(_, _) | DataType::Date))
            .unwrap_or(false)
    }

    /// Whether the timestamp column carries a time of day, not just a date.
    pub fn has_time_of_day(&self) -> bool {
        self.df
            .column(TIMESTAMP)
            .map(|c| matches!(c.dtype(), DataType::Datetime(_, _)))
            .unwrap_or(false)
    }

    /// Whether `field` can be read from the timestamp column.
    pub fn supports_calendar_field(&self, field: CalendarField) -> bool {
        match field {
            CalendarField::Hour => self.has_time_of_day(),
            CalendarField::Month => self.has_datetime_index(),
        }
    }

    /// Column values as `f64`, one entry per row. Nulls and NaN become `None`.
    pub fn values(&self, column: &str) -> PolarsResult<Vec<Option<f64>>> {
        let casted = self.df.column(column)?.cast(&DataType::Float64)?;
        let ca = casted.f64()?;
        Ok(ca
            .into_iter()
            .map(|v| v.filter(|x| !x.is_nan()))
            .collect())
    }

    /// Non-missing values of a column, in row order.
    pub fn present_values(&self, column: &str) -> PolarsResult<Vec<f64>> {
        Ok(self.values(column)?.into_iter().flatten().collect())
    }

    /// Timestamp column rendered as strings.
    pub fn timestamps(&self) -> PolarsResult<Vec<Option<String>>> {
        let casted = self.df.column(TIMESTAMP)?.cast(&DataType::String)?;
        let ca = casted.str()?;
        Ok(ca.into_iter().map(|s| s.map(str::to_string)).collect())
    }

    /// Hour-of-day or month of every row, taken from the timestamp column.
    pub fn calendar_field(&self, field: CalendarField) -> PolarsResult<Vec<Option<i32>>> {
        let expr = match field {
            CalendarField::Hour => col(TIMESTAMP).dt().hour(),
            CalendarField::Month => col(TIMESTAMP).dt().month(),
        };
        let out = self
            .df
            .clone()
            .lazy()
            .select([expr.cast(DataType::Int32).alias("field")])
            .collect()?;
        let ca = out.column("field")?.i32()?;
        Ok(ca.into_iter().collect())
    }

    /// Rows matching `predicate`, as a new table.
    pub fn filter_rows(&self, predicate: Expr) -> PolarsResult<MeasurementTable> {
        let df = self.df.clone().lazy().filter(predicate).collect()?;
        Ok(Self::from_dataframe(df))
    }

    /// Shape, dtypes and null counts. Informational only.
    pub fn info(&self) -> DatasetInfo {
        let rows = self.df.height();
        let columns = self
            .df
            .get_columns()
            .iter()
            .map(|col| {
                let null_count = col.null_count();
                let null_percentage = if rows == 0 {
                    0.0
                } else {
                    null_count as f64 / rows as f64 * 100.0
                };
                ColumnInfo {
                    name: col.name().to_string(),
                    dtype: col.dtype().to_string(),
                    null_count,
                    null_percentage,
                }
            })
            .collect();

        DatasetInfo { rows, columns }
    }

    /// Summary statistics of every numeric column.
    pub fn describe(&self) -> Result<BTreeMap<String, SummaryStats>, AnalyzerError> {
        DataAnalyzer::new(self).describe_all()
    }
}

pub(crate) fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Float32
            | DataType::Float64
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

/// Loads one measurement CSV file.
pub struct DataLoader {
    file_path: PathBuf,
    required_columns: Vec<String>,
}

impl DataLoader {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
            required_columns: Vec::new(),
        }
    }

    /// Columns whose absence makes the file a format error.
    pub fn with_required_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Read the file into a table sorted by timestamp.
    ///
    /// Column types are inferred from every row, and a value that does not
    /// parse as its column's type is a [`LoaderError::Format`].
    pub fn load(&self) -> Result<MeasurementTable, LoaderError> {
        self.check_readable()?;

        let df = LazyCsvReader::new(&self.file_path)
            .with_has_header(true)
            .with_infer_schema_length(None)
            .with_try_parse_dates(true)
            .finish()
            .and_then(|lazy| lazy.collect())
            .map_err(|e| self.format_error(e.to_string()))?;

        if df.width() == 0 {
            return Err(self.format_error("no columns in header".to_string()));
        }

        let missing: Vec<&str> = self
            .required_columns
            .iter()
            .map(String::as_str)
            .filter(|name| !df.get_column_names().iter().any(|c| c.as_str() == *name))
            .collect();
        if !missing.is_empty() {
            return Err(self.format_error(format!(
                "missing required columns: {}",
                missing.join(", ")
            )));
        }

        let mut table = MeasurementTable::from_dataframe(df);
        if table.has_datetime_index() {
            let sorted = table.dataframe().sort(
                [TIMESTAMP],
                SortMultipleOptions::default().with_maintain_order(true),
            )?;
            table = MeasurementTable::from_dataframe(sorted);
        } else if table.has_column(TIMESTAMP) {
            log::warn!(
                "{}: {} column did not parse as datetime, keeping file order",
                self.file_path.display(),
                TIMESTAMP
            );
        }

        log::info!(
            "Loaded {}: {} rows, {} columns",
            self.file_path.display(),
            table.height(),
            table.dataframe().width()
        );
        Ok(table)
    }

    fn check_readable(&self) -> Result<(), LoaderError> {
        let metadata = fs::metadata(&self.file_path).map_err(|source| LoaderError::File {
            path: self.file_path.clone(),
            source,
        })?;
        if metadata.is_dir() {
            return Err(LoaderError::File {
                path: self.file_path.clone(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "is a directory"),
            });
        }
        fs::File::open(&self.file_path).map_err(|source| LoaderError::File {
            path: self.file_path.clone(),
            source,
        })?;
        Ok(())
    }

    fn format_error(&self, reason: String) -> LoaderError {
        LoaderError::Format {
            path: self.file_path.clone(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write csv");
        file.flush().expect("flush csv");
        file
    }

    #[test]
    fn test_load_matches_file_rows_and_header() {
        let file = csv_file("GHI,DNI,DHI\n1.0,2.0,3.0\n4.0,5.0,6.0\n7.0,8.0,9.0\n");
        let table = DataLoader::new(file.path()).load().unwrap();

        assert_eq!(table.height(), 3);
        assert_eq!(table.columns(), vec!["GHI", "DNI", "DHI"]);
        assert_eq!(table.numeric_columns().len(), 3);
    }

    #[test]
    fn test_missing_file_is_file_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = DataLoader::new(dir.path().join("absent.csv"))
            .load()
            .unwrap_err();
        assert!(matches!(err, LoaderError::File { .. }));
    }

    #[test]
    fn test_directory_is_file_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = DataLoader::new(dir.path()).load().unwrap_err();
        assert!(matches!(err, LoaderError::File { .. }));
    }

    #[test]
    fn test_empty_file_is_format_error() {
        let file = csv_file("");
        let err = DataLoader::new(file.path()).load().unwrap_err();
        assert!(matches!(err, LoaderError::Format { .. }));
    }

    #[test]
    fn test_missing_required_column_is_format_error() {
        let file = csv_file("GHI,DNI\n1,2\n");
        let err = DataLoader::new(file.path())
            .with_required_columns(["GHI", "DNI", "DHI"])
            .load()
            .unwrap_err();
        match err {
            LoaderError::Format { reason, .. } => assert!(reason.contains("DHI")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rows_sorted_by_timestamp() {
        let file = csv_file(
            "Timestamp,GHI\n\
             2021-08-09 02:00:00,30\n\
             2021-08-09 00:00:00,10\n\
             2021-08-09 01:00:00,20\n",
        );
        let table = DataLoader::new(file.path()).load().unwrap();

        assert!(table.has_datetime_index());
        let stamps: Vec<String> = table.timestamps().unwrap().into_iter().flatten().collect();
        let mut sorted = stamps.clone();
        sorted.sort();
        assert_eq!(stamps, sorted);
        assert_eq!(
            table.values("GHI").unwrap(),
            vec![Some(10.0), Some(20.0), Some(30.0)]
        );
    }

    #[test]
    fn test_calendar_fields() {
        let file = csv_file(
            "Timestamp,GHI\n\
             2021-08-09 05:30:00,1\n\
             2021-12-01 17:00:00,2\n",
        );
        let table = DataLoader::new(file.path()).load().unwrap();

        let hours = table.calendar_field(CalendarField::Hour).unwrap();
        let months = table.calendar_field(CalendarField::Month).unwrap();
        assert_eq!(hours, vec![Some(5), Some(17)]);
        assert_eq!(months, vec![Some(8), Some(12)]);
    }

    #[test]
    fn test_info_reports_nulls() {
        let file = csv_file("GHI,RH\n1,\n,20\n3,30\n4,40\n");
        let info = DataLoader::new(file.path()).load().unwrap().info();

        assert_eq!(info.shape(), (4, 2));
        assert_eq!(info.missing_values()["GHI"], 1);
        assert_eq!(info.missing_values()["RH"], 1);
        assert!((info.columns[0].null_percentage - 25.0).abs() < 1e-9);
        assert_eq!(info.total_missing(), 2);
    }

    #[test]
    fn test_values_keep_row_alignment() {
        let df = df!("GHI" => [Some(1.0), None, Some(3.0)]).unwrap();
        let table = MeasurementTable::from_dataframe(df);

        assert_eq!(table.values("GHI").unwrap(), vec![Some(1.0), None, Some(3.0)]);
        assert_eq!(table.present_values("GHI").unwrap(), vec![1.0, 3.0]);
        assert!(table.values("DNI").is_err());
    }

    #[test]
    fn test_late_decimal_keeps_float_column() {
        let mut contents = String::from("GHI\n");
        contents.push_str(&"5\n".repeat(10_001));
        contents.push_str("1.5\n");
        let file = csv_file(&contents);

        let table = DataLoader::new(file.path()).load().unwrap();
        let values = table.values("GHI").unwrap();

        assert_eq!(values.len(), 10_002);
        assert_eq!(values.last(), Some(&Some(1.5)));
        assert_eq!(table.info().total_missing(), 0);
    }

    #[test]
    fn test_ragged_row_is_format_error() {
        let file = csv_file("GHI,DNI\n1,2\n3,4,5\n");
        let err = DataLoader::new(file.path()).load().unwrap_err();
        assert!(matches!(err, LoaderError::Format { .. }));
    }

    #[test]
    fn test_date_only_timestamps_have_no_hour() {
        let file = csv_file("Timestamp,GHI\n2021-08-10,2\n2021-08-09,1\n");
        let table = DataLoader::new(file.path()).load().unwrap();

        assert!(table.has_datetime_index());
        assert!(!table.has_time_of_day());
        assert!(!table.supports_calendar_field(CalendarField::Hour));
        assert!(table.supports_calendar_field(CalendarField::Month));
        assert_eq!(table.values("GHI").unwrap(), vec![Some(1.0), Some(2.0)]);
    }

    #[test]
    fn test_describe_numeric_columns() {
        let file = csv_file("GHI,Comments\n1,a\n2,b\n3,\n");
        let stats = DataLoader::new(file.path()).load().unwrap().describe().unwrap();

        assert_eq!(stats.keys().collect::<Vec<_>>(), vec!["GHI"]);
        assert_eq!(stats["GHI"].count, 3);
        assert_eq!(stats["GHI"].median, 2.0);
    }
}
