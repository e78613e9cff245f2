//! Data module - CSV loading, cleaning and the country catalogue

mod country;
mod loader;
mod processor;

pub use country::{load_cleaned_data, Country};
pub use loader::{
    CalendarField, ColumnInfo, DataLoader, DatasetInfo, LoaderError, MeasurementTable,
};
pub use processor::{
    write_csv, CleaningOptions, DataCleaner, ImputeStrategy, ProcessorError, ValidationReport,
};

/// Column names used by the measurement files.
pub mod columns {
    pub const TIMESTAMP: &str = "Timestamp";
    pub const GHI: &str = "GHI";
    pub const DNI: &str = "DNI";
    pub const DHI: &str = "DHI";
    pub const MOD_A: &str = "ModA";
    pub const MOD_B: &str = "ModB";
    pub const TAMB: &str = "Tamb";
    pub const RH: &str = "RH";
    pub const WS: &str = "WS";
    pub const WD: &str = "WD";
    pub const CLEANING: &str = "Cleaning";
    pub const COUNTRY: &str = "Country";

    /// Irradiance columns, clipped at zero during cleaning.
    pub const IRRADIANCE: [&str; 3] = [GHI, DNI, DHI];

    /// Variables compared across countries and correlated per country.
    pub const KEY_VARIABLES: [&str; 6] = [GHI, DNI, DHI, TAMB, WS, RH];
}
