//! Clean the raw per-country measurement files.
//!
//! Usage: `clean_data [RAW_DIR] [OUT_DIR]`. `RAW_DIR` defaults to the
//! working directory, `OUT_DIR` to the configured data directory.

use anyhow::Context;
use solar_insight::config::{AnalysisConfig, DEFAULT_CONFIG_FILE};
use solar_insight::data::{write_csv, CleaningOptions, DataCleaner, DataLoader};
use solar_insight::Country;
use std::fs;
use std::path::{Path, PathBuf};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AnalysisConfig::from_env(Path::new(DEFAULT_CONFIG_FILE))
        .context("loading configuration")?;

    let mut args = std::env::args_os().skip(1).map(PathBuf::from);
    let raw_dir = args.next().unwrap_or_else(|| PathBuf::from("."));
    let out_dir = args.next().unwrap_or_else(|| config.data_dir.clone());

    fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let options = CleaningOptions {
        impute: config.impute,
        ..Default::default()
    };

    for country in Country::ALL {
        log::info!("Processing {country} data...");

        let raw_path = raw_dir.join(country.raw_file_name());
        let raw = DataLoader::new(&raw_path)
            .load()
            .with_context(|| format!("loading {country} raw data"))?;

        let cleaned = DataCleaner::clean(&raw, country.name(), &options)
            .with_context(|| format!("cleaning {country} data"))?;

        let report = DataCleaner::validate(&cleaned, country.name())?;
        if !report.is_valid() {
            log::warn!("{country}: cleaned data still has gaps, see warnings above");
        }

        let out_path = out_dir.join(country.clean_file_name());
        write_csv(&cleaned, &out_path)
            .with_context(|| format!("saving {}", out_path.display()))?;
    }

    Ok(())
}
