use ::csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use anyhow::{anyhow, Context, Result};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Column the recorder writes ECG voltages under.
pub const DEFAULT_ECG_COLUMN: &str = "ecg";

/// Read one numeric column of a headed CSV, in row order.
pub fn read_csv_column(path: &Path, column: &str) -> Result<Vec<f64>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    parse_csv_column(file, column).with_context(|| format!("reading {}", path.display()))
}

pub fn parse_csv_column<R: Read>(reader: R, column: &str) -> Result<Vec<f64>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(reader);
    let headers = reader.headers().context("reading header")?.clone();
    let idx = locate_column(&headers, column)?;

    let mut out = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = result.context("reading record")?;
        let field = record
            .get(idx)
            .ok_or_else(|| anyhow!("row {} has no '{}' field", row + 2, column))?;
        let value: f64 = field
            .parse()
            .with_context(|| format!("row {} is not f64: {}", row + 2, field))?;
        out.push(value);
    }
    if out.is_empty() {
        anyhow::bail!("no samples found in column '{}'", column);
    }
    Ok(out)
}

fn locate_column(headers: &StringRecord, column: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(column))
        .ok_or_else(|| {
            anyhow!(
                "column '{}' not found (available: {})",
                column,
                headers.iter().collect::<Vec<_>>().join(", ")
            )
        })
}

/// Write samples as a two-column `time_s,<column>` CSV.
pub fn write_csv_column<W: Write>(writer: W, column: &str, fs: f64, data: &[f64]) -> Result<()> {
    let mut writer = WriterBuilder::new().from_writer(writer);
    writer.write_record(["time_s", column])?;
    for (i, value) in data.iter().enumerate() {
        writer.write_record([format!("{:.6}", i as f64 / fs), value.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}
