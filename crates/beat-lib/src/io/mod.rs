pub mod csv;
pub mod text;

use anyhow::Result;
use std::path::Path;

use crate::signal::TimeSeries;

/// Load a recording: `.csv` files by column name, anything else as one value per
/// line.
pub fn load_samples(path: &Path, column: &str) -> Result<Vec<f64>> {
    match path.extension().and_then(|s| s.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => self::csv::read_csv_column(path, column),
        _ => text::read_f64_series(path),
    }
}

pub fn load_time_series(path: &Path, column: &str, fs: f64) -> Result<TimeSeries> {
    Ok(TimeSeries::new(fs, load_samples(path, column)?))
}
