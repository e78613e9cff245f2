//! The three monitored sites and their data files.

use super::columns::IRRADIANCE;
use super::{DataLoader, LoaderError, MeasurementTable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Country {
    Benin,
    Togo,
    SierraLeone,
}

impl Country {
    pub const ALL: [Country; 3] = [Country::Benin, Country::Togo, Country::SierraLeone];

    pub fn name(self) -> &'static str {
        match self {
            Country::Benin => "Benin",
            Country::Togo => "Togo",
            Country::SierraLeone => "Sierra Leone",
        }
    }

    /// File name of the station export.
    pub fn raw_file_name(self) -> &'static str {
        match self {
            Country::Benin => "benin-malanville.csv",
            Country::Togo => "togo-dapaong_qc.csv",
            Country::SierraLeone => "sierraleone-bumbuna.csv",
        }
    }

    /// File name written by the cleaning step.
    pub fn clean_file_name(self) -> &'static str {
        match self {
            Country::Benin => "benin_clean.csv",
            Country::Togo => "togo_clean.csv",
            Country::SierraLeone => "sierraleone_clean.csv",
        }
    }

    /// Lowercase identifier used in output file names.
    pub fn slug(self) -> &'static str {
        match self {
            Country::Benin => "benin",
            Country::Togo => "togo",
            Country::SierraLeone => "sierra_leone",
        }
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Load the cleaned dataset of every country from `data_dir`.
pub fn load_cleaned_data(data_dir: &Path) -> Result<BTreeMap<Country, MeasurementTable>, LoaderError> {
    Country::ALL
        .iter()
        .map(|&country| {
            let table = DataLoader::new(data_dir.join(country.clean_file_name()))
                .with_required_columns(IRRADIANCE)
                .load()?;
            Ok((country, table))
        })
        .collect()
}
